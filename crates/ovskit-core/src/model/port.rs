use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ovskit_api::{Atom, Row, Value};
use tracing::warn;
use uuid::Uuid;

use super::{Entity, Table};
use crate::decode::RowReader;
use crate::error::CoreError;

/// An attachment point on a bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Port {
    pub uuid: Uuid,
    pub name: String,
    /// Realizing interfaces; at least one once created.
    pub interfaces: BTreeSet<Uuid>,
    /// Access VLAN. `None` is untagged.
    pub tag: Option<u16>,
    pub external_ids: BTreeMap<String, String>,
}

impl Entity for Port {
    const TABLE: Table = Table::Port;

    fn from_row(uuid: Uuid, row: &Row) -> Result<Self, CoreError> {
        let r = RowReader::new(Self::TABLE, uuid, row);
        let raw_tag: Option<i64> = r.column("tag");
        let tag = raw_tag.and_then(|t| match u16::try_from(t) {
            Ok(0) => None,
            Ok(t @ 1..=VlanTag::MAX) => Some(t),
            _ => {
                warn!(port = %uuid, tag = t, "ignoring out-of-range VLAN tag");
                None
            }
        });

        Ok(Self {
            uuid,
            name: r.column("name"),
            interfaces: r.references("interfaces")?,
            tag,
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

// ── VlanTag ──────────────────────────────────────────────────────────

/// A validated access VLAN: 0 means untagged, 1-4095 is a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VlanTag(u16);

impl VlanTag {
    pub const MAX: u16 = 4095;

    pub fn new(tag: u32) -> Result<Self, CoreError> {
        u16::try_from(tag)
            .ok()
            .filter(|t| *t <= Self::MAX)
            .map(Self)
            .ok_or(CoreError::InvalidVlanTag { tag })
    }

    pub const fn untagged() -> Self {
        Self(0)
    }

    /// The tag, or `None` when untagged.
    pub fn get(self) -> Option<u16> {
        (self.0 != 0).then_some(self.0)
    }

    /// Column value for `Port.tag`: the empty set when untagged.
    pub(crate) fn to_value(self) -> Value {
        match self.get() {
            Some(tag) => Value::Atom(Atom::Integer(i64::from(tag))),
            None => Value::empty_set(),
        }
    }
}

impl fmt::Display for VlanTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(tag) => write!(f, "{tag}"),
            None => f.write_str("untagged"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn vlan_range_is_enforced() {
        assert_eq!(VlanTag::new(0).unwrap().get(), None);
        assert_eq!(VlanTag::new(20).unwrap().get(), Some(20));
        assert_eq!(VlanTag::new(4095).unwrap().get(), Some(4095));
        assert!(matches!(
            VlanTag::new(4096),
            Err(CoreError::InvalidVlanTag { tag: 4096 })
        ));
    }

    #[test]
    fn untagged_writes_empty_set() {
        assert_eq!(VlanTag::untagged().to_value(), Value::empty_set());
        assert_eq!(VlanTag::new(7).unwrap().to_value(), Value::from(7_i64));
    }

    #[test]
    fn decodes_tagged_port() {
        let iface = Uuid::new_v4();
        let row: Row = serde_json::from_value(json!({
            "name": "p1",
            "interfaces": ["set", [["uuid", iface.to_string()]]],
            "tag": 20
        }))
        .unwrap();
        let port = Port::from_row(Uuid::new_v4(), &row).unwrap();
        assert_eq!(port.tag, Some(20));
        assert_eq!(port.interfaces, BTreeSet::from([iface]));
    }

    #[test]
    fn untagged_port_has_no_tag() {
        let row: Row = serde_json::from_value(json!({
            "name": "p1",
            "interfaces": ["set", []],
            "tag": ["set", []]
        }))
        .unwrap();
        assert_eq!(Port::from_row(Uuid::new_v4(), &row).unwrap().tag, None);
    }
}
