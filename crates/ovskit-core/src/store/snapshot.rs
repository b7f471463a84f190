// ── Initial snapshot application ──
//
// The monitor's first reply holds the full contents of every mirrored
// table. Rows are upserted first, then anything the snapshot no longer
// mentions is pruned, so readers never observe an empty cache mid-load.

use std::collections::HashSet;

use ovskit_api::TableUpdates;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApplyOutcome, DataStore};
use crate::model::Table;

impl DataStore {
    /// Bootstrap (or re-bootstrap) the cache from a full table dump.
    pub fn apply_snapshot(&self, snapshot: &TableUpdates) -> ApplyOutcome {
        let outcome = self.apply_updates(snapshot);

        let mut pruned = 0;
        for table in Table::MIRRORED {
            // Keys that failed to decode stay: their previous entity is kept.
            let keep: HashSet<Uuid> = snapshot
                .table(table.name())
                .map(|rows| {
                    rows.iter()
                        .filter(|(_, update)| !update.is_tombstone())
                        .map(|(uuid, _)| *uuid)
                        .collect()
                })
                .unwrap_or_default();

            pruned += match table {
                Table::Root => self.root.retain(&keep),
                Table::Bridge => self.bridges.retain(&keep),
                Table::Port => self.ports.retain(&keep),
                Table::Interface => self.interfaces.retain(&keep),
                Table::Controller => 0,
            };
        }
        if pruned > 0 {
            self.bump();
        }

        if self.root().is_none() {
            warn!("snapshot contains no Open_vSwitch row");
        }
        info!(
            bridges = self.bridge_count(),
            ports = self.port_count(),
            interfaces = self.interface_count(),
            dropped = outcome.dropped,
            pruned,
            "object cache loaded"
        );
        outcome
    }
}
