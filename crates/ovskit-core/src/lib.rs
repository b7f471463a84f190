// ovskit-core: switch topology cache, mutation engine and query layer on
// top of ovskit-api.

pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod model;
pub mod resolver;
pub mod store;
pub mod switch;

mod decode;
mod query;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandResult};
pub use config::{DEFAULT_DATABASE, SwitchConfig};
pub use engine::InterfaceSpec;
pub use error::CoreError;
pub use locks::{ResourceKind, ResourceLocks};
pub use resolver::{NamedRefs, Symbol};
pub use store::{ApplyOutcome, DataStore};
pub use switch::Switch;

pub use model::{Bridge, Entity, Interface, InterfaceType, Port, Root, Table, VlanTag};

// Transport-level types callers need to build a `Switch` by hand.
pub use ovskit_api::{Endpoint, OvsdbClient, Transport, TransportKind};
