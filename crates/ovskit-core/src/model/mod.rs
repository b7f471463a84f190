// ── Domain model ──
//
// Decoded, immutable views of the mirrored OVSDB tables. Every entity is
// keyed by its row UUID; bridges, ports and interfaces also carry a name.

mod bridge;
mod interface;
mod port;
mod root;

use ovskit_api::Row;
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::error::CoreError;

pub use bridge::Bridge;
pub use interface::{Interface, InterfaceType};
pub use port::{Port, VlanTag};
pub use root::Root;

/// Tables this crate reads or writes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, IntoStaticStr,
)]
pub enum Table {
    /// The singleton root row.
    #[strum(serialize = "Open_vSwitch")]
    Root,
    Bridge,
    Port,
    Interface,
    /// Written when assigning a controller, never mirrored.
    Controller,
}

impl Table {
    /// Tables the object cache keeps in sync.
    pub const MIRRORED: [Self; 4] = [Self::Root, Self::Bridge, Self::Port, Self::Interface];

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A row type the object cache can mirror.
pub trait Entity: std::fmt::Debug + Send + Sync + Sized + 'static {
    const TABLE: Table;

    /// Decode a full row. Fails only on a malformed reference column.
    fn from_row(uuid: Uuid, row: &Row) -> Result<Self, CoreError>;

    fn uuid(&self) -> Uuid;

    /// Unique name, if the table has one.
    fn name(&self) -> Option<&str> {
        None
    }
}
