// ── OVSDB value encoding ──
//
// RFC 7047 §5.1 notation: atoms are bare JSON scalars or tagged pairs
// (`["uuid", ..]`, `["named-uuid", ..]`); sets and maps are tagged arrays
// (`["set", [..]]`, `["map", [[k, v], ..]]`). A set of exactly one element
// may also be sent as the bare atom, so decoders must accept both.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as Json;
use uuid::Uuid;

use crate::error::Error;

/// A single OVSDB atom.
#[derive(Debug, Clone, PartialEq)]
pub enum Atom {
    String(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    /// A committed row reference.
    Uuid(Uuid),
    /// A transaction-scoped placeholder for a row inserted in the same
    /// transaction. Only valid inside an outgoing `transact`.
    NamedUuid(String),
}

impl Atom {
    pub fn to_json(&self) -> Json {
        match self {
            Self::String(s) => Json::String(s.clone()),
            Self::Integer(i) => Json::from(*i),
            Self::Real(r) => Json::from(*r),
            Self::Boolean(b) => Json::Bool(*b),
            Self::Uuid(u) => serde_json::json!(["uuid", u.to_string()]),
            Self::NamedUuid(n) => serde_json::json!(["named-uuid", n]),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, Error> {
        match json {
            Json::String(s) => Ok(Self::String(s.clone())),
            Json::Bool(b) => Ok(Self::Boolean(*b)),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Real))
                .ok_or_else(|| Error::decode("atom", json)),
            Json::Array(pair) => match pair.as_slice() {
                [Json::String(tag), Json::String(id)] if tag == "uuid" => Uuid::parse_str(id)
                    .map(Self::Uuid)
                    .map_err(|_| Error::decode("uuid", json)),
                [Json::String(tag), Json::String(id)] if tag == "named-uuid" => {
                    Ok(Self::NamedUuid(id.clone()))
                }
                _ => Err(Error::decode("atom", json)),
            },
            Json::Null | Json::Object(_) => Err(Error::decode("atom", json)),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) => Some(*u),
            _ => None,
        }
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Atom {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Atom {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Atom {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for Atom {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

// ── Value ────────────────────────────────────────────────────────────

/// A column value: a bare atom, a set of atoms, or a map.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Atom(Atom),
    Set(Vec<Atom>),
    Map(Vec<(Atom, Atom)>),
}

impl Value {
    /// The empty set. Used to clear optional columns such as `Port.tag`.
    pub fn empty_set() -> Self {
        Self::Set(Vec::new())
    }

    pub fn set<I, A>(atoms: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Atom>,
    {
        Self::Set(atoms.into_iter().map(Into::into).collect())
    }

    pub fn string_map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Atom::String(k.into()), Atom::String(v.into())))
                .collect(),
        )
    }

    pub fn to_json(&self) -> Json {
        match self {
            Self::Atom(a) => a.to_json(),
            Self::Set(atoms) => {
                serde_json::json!(["set", atoms.iter().map(Atom::to_json).collect::<Vec<_>>()])
            }
            Self::Map(pairs) => serde_json::json!([
                "map",
                pairs
                    .iter()
                    .map(|(k, v)| Json::Array(vec![k.to_json(), v.to_json()]))
                    .collect::<Vec<_>>()
            ]),
        }
    }

    pub fn from_json(json: &Json) -> Result<Self, Error> {
        if let Json::Array(items) = json {
            match items.as_slice() {
                [Json::String(tag), Json::Array(elems)] if tag == "set" => {
                    return elems
                        .iter()
                        .map(Atom::from_json)
                        .collect::<Result<Vec<_>, _>>()
                        .map(Self::Set);
                }
                [Json::String(tag), Json::Array(pairs)] if tag == "map" => {
                    return pairs
                        .iter()
                        .map(|pair| match pair {
                            Json::Array(kv) => match kv.as_slice() {
                                [k, v] => Ok((Atom::from_json(k)?, Atom::from_json(v)?)),
                                _ => Err(Error::decode("map pair", pair)),
                            },
                            other => Err(Error::decode("map pair", other)),
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Self::Map);
                }
                _ => {}
            }
        }
        Atom::from_json(json).map(Self::Atom)
    }

    /// View the value as a list of atoms. A bare atom is a singleton set.
    pub fn atoms(&self) -> Result<&[Atom], Error> {
        match self {
            Self::Atom(a) => Ok(std::slice::from_ref(a)),
            Self::Set(atoms) => Ok(atoms),
            Self::Map(_) => Err(Error::Decode {
                expected: "set",
                found: "map".into(),
            }),
        }
    }

    /// View the value as key/value pairs. An empty set is an empty map.
    pub fn pairs(&self) -> Result<&[(Atom, Atom)], Error> {
        match self {
            Self::Map(pairs) => Ok(pairs),
            Self::Set(atoms) if atoms.is_empty() => Ok(&[]),
            other => Err(Error::Decode {
                expected: "map",
                found: other.to_json().to_string(),
            }),
        }
    }
}

impl From<Atom> for Value {
    fn from(a: Atom) -> Self {
        Self::Atom(a)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Atom(s.into())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Atom(s.into())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Atom(i.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Atom(b.into())
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Atom(u.into())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        Self::from_json(&json).map_err(serde::de::Error::custom)
    }
}

// ── Row ──────────────────────────────────────────────────────────────

/// A table row as column name → raw JSON value.
///
/// Columns stay undecoded so a consumer can decode them one at a time and
/// decide per column whether a malformed value is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(BTreeMap<String, Json>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style column insert.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into().to_json());
    }

    /// Raw JSON of a column, if present.
    pub fn get(&self, column: &str) -> Option<&Json> {
        self.0.get(column)
    }

    /// Decode a column into a [`Value`]. `None` if the column is absent.
    pub fn value(&self, column: &str) -> Option<Result<Value, Error>> {
        self.0.get(column).map(Value::from_json)
    }

    /// The row's `_uuid` column, present on rows returned by `select`.
    pub fn uuid(&self) -> Option<Uuid> {
        match self.value("_uuid")? {
            Ok(Value::Atom(Atom::Uuid(u))) => Some(u),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &Json)> {
        self.0.iter()
    }
}

impl FromIterator<(String, Json)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Json)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
