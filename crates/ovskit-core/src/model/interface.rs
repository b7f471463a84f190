use std::collections::BTreeMap;
use std::fmt;

use ovskit_api::Row;
use uuid::Uuid;

use super::{Entity, Table};
use crate::decode::RowReader;
use crate::error::CoreError;

/// Datapath flavour of an interface (`Interface.type`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InterfaceType {
    Internal,
    /// An existing kernel device (veth end, NIC). Stored as `system`;
    /// the server also reports it as the empty string.
    #[default]
    System,
    Patch,
    Peer,
    /// Anything else the server reports, preserved verbatim.
    Other(String),
}

impl InterfaceType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Internal => "internal",
            Self::System => "system",
            Self::Patch => "patch",
            Self::Peer => "peer",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for InterfaceType {
    fn from(s: &str) -> Self {
        match s {
            "internal" => Self::Internal,
            "" | "system" => Self::System,
            "patch" => Self::Patch,
            "peer" => Self::Peer,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The leaf datapath endpoint realizing a port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interface {
    pub uuid: Uuid,
    pub name: String,
    pub kind: InterfaceType,
    /// Type-specific settings; patch interfaces carry `peer`.
    pub options: BTreeMap<String, String>,
    pub ofport: Option<i64>,
    pub external_ids: BTreeMap<String, String>,
}

impl Interface {
    /// The `peer` option of a patch/peer interface.
    pub fn peer(&self) -> Option<&str> {
        self.options.get("peer").map(String::as_str)
    }
}

impl Entity for Interface {
    const TABLE: Table = Table::Interface;

    fn from_row(uuid: Uuid, row: &Row) -> Result<Self, CoreError> {
        let r = RowReader::new(Self::TABLE, uuid, row);
        let kind: String = r.column("type");
        Ok(Self {
            uuid,
            name: r.column("name"),
            kind: InterfaceType::from(kind.as_str()),
            options: r.column("options"),
            ofport: r.column("ofport"),
            external_ids: r.column("external_ids"),
        })
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}
