// ── Table updates ──
//
// Payload of a `monitor` reply and of every `update` notification:
// `{ <table>: { <uuid>: { "old": <row>, "new": <row> } } }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::Error;
use crate::value::Row;

/// Old and new versions of a single row.
///
/// A missing or empty `new` is a tombstone: the row has been deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Row>,
}

impl RowUpdate {
    pub fn insert(row: Row) -> Self {
        Self {
            old: None,
            new: Some(row),
        }
    }

    pub fn tombstone(old: Option<Row>) -> Self {
        Self { old, new: None }
    }

    pub fn is_tombstone(&self) -> bool {
        self.new.as_ref().is_none_or(Row::is_empty)
    }
}

/// Changed rows of one table, keyed by row identity.
pub type TableUpdate = BTreeMap<Uuid, RowUpdate>;

/// Changed rows of every monitored table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableUpdates(pub BTreeMap<String, TableUpdate>);

impl TableUpdates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: Json) -> Result<Self, Error> {
        if json.is_null() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(json)?)
    }

    /// Record a change for `table`. A later change to the same row
    /// replaces an earlier one.
    pub fn push(&mut self, table: impl Into<String>, uuid: Uuid, update: RowUpdate) {
        self.0.entry(table.into()).or_default().insert(uuid, update);
    }

    pub fn table(&self, name: &str) -> Option<&TableUpdate> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableUpdate)> {
        self.0.iter().map(|(name, rows)| (name.as_str(), rows))
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }

    /// Total number of row changes across all tables.
    pub fn row_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }
}
