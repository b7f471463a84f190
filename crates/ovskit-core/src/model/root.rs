use std::collections::BTreeSet;

use ovskit_api::Row;
use uuid::Uuid;

use super::{Entity, Table};
use crate::decode::RowReader;
use crate::error::CoreError;

/// The singleton `Open_vSwitch` row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Root {
    pub uuid: Uuid,
    pub bridges: BTreeSet<Uuid>,
    pub ovs_version: Option<String>,
}

impl Entity for Root {
    const TABLE: Table = Table::Root;

    fn from_row(uuid: Uuid, row: &Row) -> Result<Self, CoreError> {
        let r = RowReader::new(Self::TABLE, uuid, row);
        Ok(Self {
            uuid,
            bridges: r.references("bridges")?,
            ovs_version: r.column("ovs_version"),
        })
    }

    fn uuid(&self) -> Uuid {
        self.uuid
    }
}
