// ── Transaction operations ──
//
// The five row operations of RFC 7047 §5.2 that a `transact` request
// carries, plus the per-operation results the server answers with.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::value::{Atom, Row, Value};

// ── Conditions ───────────────────────────────────────────────────────

/// Comparison function of a `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    #[serde(rename = "==")]
    Equal,
    #[serde(rename = "!=")]
    NotEqual,
    #[serde(rename = "includes")]
    Includes,
    #[serde(rename = "excludes")]
    Excludes,
}

/// A single `[column, function, value]` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub function: Function,
    pub value: Value,
}

impl Condition {
    pub fn new(column: impl Into<String>, function: Function, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            function,
            value: value.into(),
        }
    }

    /// `column == value`
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Function::Equal, value)
    }

    /// `column includes value` (set containment).
    pub fn includes(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, Function::Includes, value)
    }

    /// Match a row by its identity key.
    pub fn uuid(uuid: Uuid) -> Self {
        Self::eq("_uuid", uuid)
    }
}

impl Serialize for Condition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.column, self.function, &self.value).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (column, function, value) = <(String, Function, Value)>::deserialize(deserializer)?;
        Ok(Self {
            column,
            function,
            value,
        })
    }
}

// ── Mutations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutator {
    /// Set/map union.
    #[serde(rename = "insert")]
    Insert,
    /// Set/map difference.
    #[serde(rename = "delete")]
    Delete,
    #[serde(rename = "+=")]
    Add,
    #[serde(rename = "-=")]
    Subtract,
}

/// A single `[column, mutator, value]` mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub column: String,
    pub mutator: Mutator,
    pub value: Value,
}

impl Mutation {
    pub fn insert(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            mutator: Mutator::Insert,
            value: value.into(),
        }
    }

    pub fn delete(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            mutator: Mutator::Delete,
            value: value.into(),
        }
    }
}

impl Serialize for Mutation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.column, self.mutator, &self.value).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Mutation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (column, mutator, value) = <(String, Mutator, Value)>::deserialize(deserializer)?;
        Ok(Self {
            column,
            mutator,
            value,
        })
    }
}

// ── Operation ────────────────────────────────────────────────────────

/// One operation inside a `transact` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    Insert {
        table: String,
        row: Row,
        #[serde(rename = "uuid-name", default, skip_serializing_if = "Option::is_none")]
        uuid_name: Option<String>,
    },
    Select {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        columns: Option<Vec<String>>,
    },
    Update {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        row: Row,
    },
    Mutate {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
        mutations: Vec<Mutation>,
    },
    Delete {
        table: String,
        #[serde(rename = "where")]
        conditions: Vec<Condition>,
    },
}

impl Operation {
    pub fn insert(table: impl Into<String>, row: Row, uuid_name: Option<String>) -> Self {
        Self::Insert {
            table: table.into(),
            row,
            uuid_name,
        }
    }

    pub fn select(table: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self::Select {
            table: table.into(),
            conditions,
            columns: None,
        }
    }

    pub fn update(table: impl Into<String>, conditions: Vec<Condition>, row: Row) -> Self {
        Self::Update {
            table: table.into(),
            conditions,
            row,
        }
    }

    pub fn mutate(
        table: impl Into<String>,
        conditions: Vec<Condition>,
        mutations: Vec<Mutation>,
    ) -> Self {
        Self::Mutate {
            table: table.into(),
            conditions,
            mutations,
        }
    }

    pub fn delete(table: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self::Delete {
            table: table.into(),
            conditions,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::Insert { table, .. }
            | Self::Select { table, .. }
            | Self::Update { table, .. }
            | Self::Mutate { table, .. }
            | Self::Delete { table, .. } => table,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Select { .. } => "select",
            Self::Update { .. } => "update",
            Self::Mutate { .. } => "mutate",
            Self::Delete { .. } => "delete",
        }
    }

    /// Whether the operation writes to the database.
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Select { .. })
    }
}

// ── Results ──────────────────────────────────────────────────────────

/// The server's answer to a single operation.
///
/// Inserts carry `uuid`, selects carry `rows`, updates/mutates/deletes
/// carry `count`. Any result may instead carry `error` (and `details`).
/// Operations after a failed one are answered with `null`, which decodes
/// to an all-empty result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationResult {
    #[serde(default, deserialize_with = "uuid_atom")]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub rows: Option<Vec<Row>>,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

impl OperationResult {
    pub fn is_error(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.is_empty())
    }

    /// Rows of a `select`, or an empty slice for any other result.
    pub fn rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or_default()
    }

    /// Decode a `transact` reply array, tolerating `null` entries.
    pub fn list_from_json(json: Json) -> Result<Vec<Self>, crate::Error> {
        let raw: Vec<Option<Self>> = serde_json::from_value(json)?;
        Ok(raw.into_iter().map(Option::unwrap_or_default).collect())
    }
}

fn uuid_atom<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
    let Some(json) = Option::<Json>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match Atom::from_json(&json) {
        Ok(Atom::Uuid(u)) => Ok(Some(u)),
        _ => Err(de::Error::custom(format!("expected uuid atom, got {json}"))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn insert_serializes_with_uuid_name() {
        let op = Operation::insert(
            "Interface",
            Row::new().with("name", "br0").with("type", "internal"),
            Some("row_interface0".into()),
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "insert",
                "table": "Interface",
                "row": { "name": "br0", "type": "internal" },
                "uuid-name": "row_interface0"
            })
        );
    }

    #[test]
    fn mutate_serializes_conditions_and_mutations_as_triples() {
        let root = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let op = Operation::mutate(
            "Open_vSwitch",
            vec![Condition::uuid(root)],
            vec![Mutation::insert(
                "bridges",
                Value::set([Atom::NamedUuid("row_bridge0".into())]),
            )],
        );
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({
                "op": "mutate",
                "table": "Open_vSwitch",
                "where": [["_uuid", "==", ["uuid", "550e8400-e29b-41d4-a716-446655440000"]]],
                "mutations": [["bridges", "insert", ["set", [["named-uuid", "row_bridge0"]]]]]
            })
        );
    }

    #[test]
    fn select_omits_columns_when_unset() {
        let op = Operation::select("Bridge", vec![Condition::eq("name", "br0")]);
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({ "op": "select", "table": "Bridge", "where": [["name", "==", "br0"]] })
        );
    }

    #[test]
    fn operation_deserializes_back() {
        let op = Operation::delete("Port", vec![Condition::eq("name", "p1")]);
        let json = serde_json::to_value(&op).unwrap();
        let back: Operation = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }

    #[test]
    fn results_tolerate_nulls_and_errors() {
        let id = Uuid::new_v4();
        let results = OperationResult::list_from_json(json!([
            { "uuid": ["uuid", id.to_string()] },
            { "error": "referential integrity violation", "details": "dangling ref" },
            null
        ]))
        .unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].uuid, Some(id));
        assert!(results[1].is_error());
        assert_eq!(results[1].details.as_deref(), Some("dangling ref"));
        assert_eq!(results[2], OperationResult::default());
    }

    #[test]
    fn select_result_exposes_rows() {
        let results = OperationResult::list_from_json(json!([
            { "rows": [{ "name": "br0" }, { "name": "br1" }] }
        ]))
        .unwrap();
        assert_eq!(results[0].rows().len(), 2);
        assert!(!results[0].is_error());
    }
}
