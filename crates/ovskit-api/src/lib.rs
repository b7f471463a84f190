// ovskit-api: Async OVSDB (RFC 7047) client: wire types, stream codec, transport

pub mod client;
pub mod codec;
pub mod error;
pub mod operation;
pub mod rpc;
pub mod transport;
pub mod update;
pub mod value;

pub use client::OvsdbClient;
pub use codec::JsonCodec;
pub use error::Error;
pub use operation::{Condition, Function, Mutation, Mutator, Operation, OperationResult};
pub use transport::{Endpoint, Monitor, Transport, TransportConfig, TransportKind};
pub use update::{RowUpdate, TableUpdate, TableUpdates};
pub use value::{Atom, Row, Value};
