// ── Object cache ──
//
// In-memory mirror of the Open_vSwitch, Bridge, Port and Interface tables,
// written only by the change-stream consumer and read by everyone else.

use std::sync::Arc;
use std::time::Duration;

use ovskit_api::{RowUpdate, TableUpdates};
use tokio::sync::watch;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::table::TableCache;
use crate::error::CoreError;
use crate::model::{Bridge, Entity, Interface, Port, Root, Table};

/// Counts from applying a batch of change records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Records that changed the cache.
    pub applied: usize,
    /// Records rejected because a reference column failed to decode.
    pub dropped: usize,
}

/// Central cache of the mirrored switch topology.
///
/// Each table sits behind its own reader/writer lock. Every mutation
/// bumps a store-wide version observable through
/// [`subscribe_changes`](Self::subscribe_changes).
pub struct DataStore {
    pub(crate) root: TableCache<Root>,
    pub(crate) bridges: TableCache<Bridge>,
    pub(crate) ports: TableCache<Port>,
    pub(crate) interfaces: TableCache<Interface>,
    changes: watch::Sender<u64>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(0u64);
        Self {
            root: TableCache::new(),
            bridges: TableCache::new(),
            ports: TableCache::new(),
            interfaces: TableCache::new(),
            changes,
        }
    }

    // ── Change application ───────────────────────────────────────────

    /// Apply one change record.
    ///
    /// A tombstone removes the key (absent key is a no-op); anything else
    /// decodes the row and installs it. On a decode error the previous
    /// entity for `uuid` is left untouched. Records for tables the cache
    /// does not mirror are ignored. Returns whether the cache changed.
    pub fn apply(&self, table: &str, uuid: Uuid, update: &RowUpdate) -> Result<bool, CoreError> {
        let changed = match table.parse::<Table>() {
            Ok(Table::Root) => apply_row(&self.root, uuid, update)?,
            Ok(Table::Bridge) => apply_row(&self.bridges, uuid, update)?,
            Ok(Table::Port) => apply_row(&self.ports, uuid, update)?,
            Ok(Table::Interface) => apply_row(&self.interfaces, uuid, update)?,
            Ok(Table::Controller) | Err(_) => {
                trace!(table, "ignoring update for unmirrored table");
                false
            }
        };
        if changed {
            self.changes.send_modify(|v| *v += 1);
        }
        Ok(changed)
    }

    /// Apply every record of a change notification. A record that fails
    /// to decode is logged and dropped; the rest still apply.
    pub fn apply_updates(&self, updates: &TableUpdates) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();
        for (table, rows) in updates.iter() {
            for (uuid, update) in rows {
                match self.apply(table, *uuid, update) {
                    Ok(true) => outcome.applied += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(table, %uuid, error = %e, "dropping undecodable change record");
                        outcome.dropped += 1;
                    }
                }
            }
        }
        debug!(
            applied = outcome.applied,
            dropped = outcome.dropped,
            "applied change notification"
        );
        outcome
    }

    // ── Single-entity lookups ────────────────────────────────────────

    /// The root row, once the initial snapshot has been applied.
    pub fn root(&self) -> Option<Arc<Root>> {
        self.root.snapshot().into_iter().next()
    }

    pub fn bridge_by_name(&self, name: &str) -> Option<Arc<Bridge>> {
        self.bridges.get_by_name(name)
    }

    pub fn bridge_by_key(&self, uuid: &Uuid) -> Option<Arc<Bridge>> {
        self.bridges.get(uuid)
    }

    pub fn port_by_name(&self, name: &str) -> Option<Arc<Port>> {
        self.ports.get_by_name(name)
    }

    pub fn port_by_key(&self, uuid: &Uuid) -> Option<Arc<Port>> {
        self.ports.get(uuid)
    }

    pub fn interface_by_name(&self, name: &str) -> Option<Arc<Interface>> {
        self.interfaces.get_by_name(name)
    }

    pub fn interface_by_key(&self, uuid: &Uuid) -> Option<Arc<Interface>> {
        self.interfaces.get(uuid)
    }

    // ── Relationship lookups ─────────────────────────────────────────

    /// Cached member ports of `bridge`. Keys not (yet) cached are skipped.
    pub fn ports_of(&self, bridge: &Bridge) -> Vec<Arc<Port>> {
        self.ports.get_many(&bridge.ports)
    }

    /// Cached interfaces of `port`. Keys not (yet) cached are skipped.
    pub fn interfaces_of(&self, port: &Port) -> Vec<Arc<Interface>> {
        self.interfaces.get_many(&port.interfaces)
    }

    // ── Count accessors ──────────────────────────────────────────────

    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn interface_count(&self) -> usize {
        self.interfaces.len()
    }

    // ── Change observation ───────────────────────────────────────────

    /// Store-wide version, bumped whenever any table changes.
    pub fn version(&self) -> u64 {
        *self.changes.borrow()
    }

    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Wait until `predicate` holds for the cache, re-checking after every
    /// change. Returns `false` if `timeout` elapses first.
    pub async fn wait_until<F>(&self, timeout: Duration, mut predicate: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        let mut changes = self.changes.subscribe();
        let wait = async {
            loop {
                if predicate(self) {
                    return true;
                }
                if changes.changed().await.is_err() {
                    return predicate(self);
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    pub(crate) fn bump(&self) {
        self.changes.send_modify(|v| *v += 1);
    }
}

fn apply_row<T: Entity>(
    cache: &TableCache<T>,
    uuid: Uuid,
    update: &RowUpdate,
) -> Result<bool, CoreError> {
    match &update.new {
        Some(row) if !row.is_empty() => {
            let entity = T::from_row(uuid, row)?;
            let is_new = cache.upsert(entity);
            trace!(table = %T::TABLE, %uuid, is_new, "row installed");
            Ok(true)
        }
        _ => Ok(cache.remove(&uuid).is_some()),
    }
}
