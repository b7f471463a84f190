// ── Topology mutation engine ──
//
// Every mutation follows the same shape: validate input, take the lock
// for its resource kind, check preconditions with a direct `select`
// (the cache may lag), build the operation list with named references,
// and submit it as one transaction.

mod bridge;
mod interface;
mod port;

use std::collections::{BTreeMap, BTreeSet};

use ovskit_api::{Operation, Row, Value};
use uuid::Uuid;

use crate::decode::RowReader;
use crate::error::CoreError;
use crate::model::{InterfaceType, Table, VlanTag};
use crate::resolver::Symbol;

/// Shape of an interface row to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceSpec {
    pub name: String,
    pub kind: InterfaceType,
    pub options: BTreeMap<String, String>,
}

impl InterfaceSpec {
    pub fn new(name: impl Into<String>, kind: InterfaceType) -> Self {
        Self {
            name: name.into(),
            kind,
            options: BTreeMap::new(),
        }
    }

    pub fn internal(name: impl Into<String>) -> Self {
        Self::new(name, InterfaceType::Internal)
    }

    /// A plain kernel device (`type = system`).
    pub fn system(name: impl Into<String>) -> Self {
        Self::new(name, InterfaceType::System)
    }

    /// One end of a patch pair; `peer` names the other end.
    pub fn patch(name: impl Into<String>, peer: impl Into<String>) -> Self {
        Self::new(name, InterfaceType::Patch).with_option("peer", peer)
    }

    pub fn peer(name: impl Into<String>, peer: impl Into<String>) -> Self {
        Self::new(name, InterfaceType::Peer).with_option("peer", peer)
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> Result<(), CoreError> {
        require_name("interface", &self.name)?;
        match self.options.get("peer") {
            Some(peer) if peer.trim().is_empty() => {
                Err(CoreError::invalid("peer name must not be empty"))
            }
            _ => Ok(()),
        }
    }

    /// `insert` for this interface, named by `symbol`.
    fn insert(&self, symbol: &Symbol) -> Operation {
        let mut row = Row::new()
            .with("name", self.name.as_str())
            .with("type", self.kind.as_str());
        if !self.options.is_empty() {
            row.insert("options", Value::string_map(self.options.clone()));
        }
        Operation::insert(Table::Interface.name(), row, Some(symbol.uuid_name()))
    }
}

/// `insert` for a port holding the single interface `interface`.
fn port_insert(name: &str, interface: &Symbol, tag: VlanTag, symbol: &Symbol) -> Operation {
    let mut row = Row::new()
        .with("name", name)
        .with("interfaces", interface.reference_set());
    if tag.get().is_some() {
        row.insert("tag", tag.to_value());
    }
    Operation::insert(Table::Port.name(), row, Some(symbol.uuid_name()))
}

pub(crate) fn require_name(what: &str, name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::invalid(format!("{what} name must not be empty")));
    }
    Ok(())
}

/// Key of a row returned by `select`.
fn row_uuid(table: Table, row: &Row) -> Result<Uuid, CoreError> {
    row.uuid().ok_or_else(|| CoreError::Decode {
        table: table.into(),
        uuid: "<unknown>".into(),
        column: "_uuid".into(),
        message: "row has no key".into(),
    })
}

fn row_references(table: Table, row: &Row, column: &str) -> Result<BTreeSet<Uuid>, CoreError> {
    let uuid = row_uuid(table, row)?;
    RowReader::new(table, uuid, row).references(column)
}

fn row_name(table: Table, row: &Row) -> Option<String> {
    let uuid = row.uuid()?;
    let name: String = RowReader::new(table, uuid, row).column("name");
    (!name.is_empty()).then_some(name)
}
