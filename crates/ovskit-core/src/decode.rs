// ── Column decoding ──
//
// One decoder per column shape, shared by every entity. Scalars and
// optional scalars are best-effort: a malformed value is logged and the
// field keeps its default. Reference sets are strict: a malformed value
// fails the whole row so the cache never installs a half-wired entity.

use std::collections::{BTreeMap, BTreeSet};

use ovskit_api::{Atom, Row, Value};
use tracing::warn;
use uuid::Uuid;

use crate::error::CoreError;
use crate::model::Table;

/// Projection of an OVSDB [`Value`] onto a Rust type.
pub trait DecodeColumn: Sized {
    /// Human-readable shape, used in diagnostics.
    const EXPECTED: &'static str;

    fn decode(value: &Value) -> Option<Self>;
}

/// Scalars arrive as a bare atom; optional scalars as a set of zero or one.
macro_rules! scalar_column {
    ($ty:ty, $expected:literal, $convert:expr) => {
        impl DecodeColumn for $ty {
            const EXPECTED: &'static str = $expected;

            fn decode(value: &Value) -> Option<Self> {
                match value.atoms().ok()? {
                    [atom] => ($convert)(atom),
                    _ => None,
                }
            }
        }

        impl DecodeColumn for Option<$ty> {
            const EXPECTED: &'static str = concat!("optional ", $expected);

            fn decode(value: &Value) -> Option<Self> {
                match value.atoms().ok()? {
                    [] => Some(None),
                    [atom] => ($convert)(atom).map(Some),
                    _ => None,
                }
            }
        }
    };
}

scalar_column!(String, "string", |a: &Atom| a.as_str().map(str::to_owned));
scalar_column!(i64, "integer", Atom::as_integer);
scalar_column!(bool, "boolean", Atom::as_bool);
scalar_column!(Uuid, "uuid", Atom::as_uuid);

/// A single reference and a set of references both decode to a set.
impl DecodeColumn for BTreeSet<Uuid> {
    const EXPECTED: &'static str = "set of uuids";

    fn decode(value: &Value) -> Option<Self> {
        value.atoms().ok()?.iter().map(Atom::as_uuid).collect()
    }
}

impl DecodeColumn for BTreeMap<String, String> {
    const EXPECTED: &'static str = "string map";

    fn decode(value: &Value) -> Option<Self> {
        value
            .pairs()
            .ok()?
            .iter()
            .map(|(k, v)| Some((k.as_str()?.to_owned(), v.as_str()?.to_owned())))
            .collect()
    }
}

// ── RowReader ────────────────────────────────────────────────────────

/// Column accessor for one row, carrying enough context for diagnostics.
pub(crate) struct RowReader<'a> {
    table: Table,
    uuid: Uuid,
    row: &'a Row,
}

impl<'a> RowReader<'a> {
    pub(crate) fn new(table: Table, uuid: Uuid, row: &'a Row) -> Self {
        Self { table, uuid, row }
    }

    /// Best-effort column: absent or malformed yields the default.
    pub(crate) fn column<T: DecodeColumn + Default>(&self, column: &str) -> T {
        match self.decode(column) {
            Ok(value) => value.unwrap_or_default(),
            Err(message) => {
                warn!(
                    table = %self.table,
                    uuid = %self.uuid,
                    column,
                    %message,
                    "ignoring undecodable column"
                );
                T::default()
            }
        }
    }

    /// Strict reference column: absent yields an empty set, malformed is
    /// an error.
    pub(crate) fn references(&self, column: &str) -> Result<BTreeSet<Uuid>, CoreError> {
        self.decode(column)
            .map(Option::unwrap_or_default)
            .map_err(|message| CoreError::Decode {
                table: self.table.into(),
                uuid: self.uuid.to_string(),
                column: column.to_owned(),
                message,
            })
    }

    fn decode<T: DecodeColumn>(&self, column: &str) -> Result<Option<T>, String> {
        let Some(raw) = self.row.value(column) else {
            return Ok(None);
        };
        let value = raw.map_err(|e| e.to_string())?;
        T::decode(&value).map(Some).ok_or_else(|| {
            format!(
                "expected {}, got {}",
                T::EXPECTED,
                self.row.get(column).map(ToString::to_string).unwrap_or_default()
            )
        })
    }
}
