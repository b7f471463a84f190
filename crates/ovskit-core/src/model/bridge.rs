use std::collections::{BTreeMap, BTreeSet};

use ovskit_api::Row;
use uuid::Uuid;

use super::{Entity, Table};
use crate::decode::RowReader;
use crate::error::CoreError;

/// A virtual switch instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bridge {
    pub uuid: Uuid,
    pub name: String,
    /// Member ports. Mirrors the `ports` column of the last applied update.
    pub ports: BTreeSet<Uuid>,
    /// Zero or one controller in practice.
    pub controller: BTreeSet<Uuid>,
    pub datapath_id: Option<String>,
    pub stp_enable: bool,
    pub fail_mode: Option<String>,
    pub external_ids: BTreeMap<String, String>,
}

impl Entity for Bridge {
    const TABLE: Table = Table::Bridge;

    fn from_row(uuid: Uuid, row: &Row) -> Result<Self, CoreError> {
        let r = RowReader::new(Self::TABLE, uuid, row);
        Ok(Self {
            uuid,
            name: r.column("name"),
            ports: r.references("ports")?,
            controller: r.references("controller")?,
            datapath_id: r.column("datapath_id"),
            stp_enable: r.column("stp_enable"),
            fail_mode: r.column("fail_mode"),
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
