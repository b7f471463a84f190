// ── Per-table entity cache ──
//
// One reader/writer lock per table guarding the UUID map and its name
// index together. Locks are held for a single map operation only. Change
// signalling lives in the owning `DataStore`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::model::Entity;

struct Entries<T> {
    by_uuid: HashMap<Uuid, Arc<T>>,
    /// Secondary index: name -> uuid.
    by_name: HashMap<String, Uuid>,
}

impl<T: Entity> Entries<T> {
    fn unindex(&mut self, old: &T) {
        if let Some(name) = old.name() {
            if self.by_name.get(name) == Some(&old.uuid()) {
                self.by_name.remove(name);
            }
        }
    }
}

pub(crate) struct TableCache<T: Entity> {
    entries: RwLock<Entries<T>>,
}

impl<T: Entity> TableCache<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: RwLock::new(Entries {
                by_uuid: HashMap::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// Insert or replace an entity. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, entity: T) -> bool {
        let uuid = entity.uuid();
        let name = entity.name().map(str::to_owned);
        let mut entries = self.write();
        let previous = entries.by_uuid.insert(uuid, Arc::new(entity));
        if let Some(old) = &previous {
            entries.unindex(old);
        }
        if let Some(name) = name {
            entries.by_name.insert(name, uuid);
        }
        previous.is_none()
    }

    /// Remove an entity. Returns the removed entity if it existed.
    pub(crate) fn remove(&self, uuid: &Uuid) -> Option<Arc<T>> {
        let mut entries = self.write();
        let removed = entries.by_uuid.remove(uuid);
        if let Some(old) = &removed {
            entries.unindex(old);
        }
        removed
    }

    /// Drop every entity whose key is not in `keep`. Returns how many
    /// were removed.
    pub(crate) fn retain(&self, keep: &HashSet<Uuid>) -> usize {
        let mut entries = self.write();
        let stale: Vec<Uuid> = entries
            .by_uuid
            .keys()
            .filter(|uuid| !keep.contains(uuid))
            .copied()
            .collect();
        for uuid in &stale {
            if let Some(old) = entries.by_uuid.remove(uuid) {
                entries.unindex(&old);
            }
        }
        stale.len()
    }

    pub(crate) fn get(&self, uuid: &Uuid) -> Option<Arc<T>> {
        self.read().by_uuid.get(uuid).cloned()
    }

    pub(crate) fn get_by_name(&self, name: &str) -> Option<Arc<T>> {
        let entries = self.read();
        let uuid = entries.by_name.get(name)?;
        entries.by_uuid.get(uuid).cloned()
    }

    /// Resolve several keys under one read lock. Unknown keys are skipped.
    pub(crate) fn get_many<'a, I>(&self, uuids: I) -> Vec<Arc<T>>
    where
        I: IntoIterator<Item = &'a Uuid>,
    {
        let entries = self.read();
        uuids
            .into_iter()
            .filter_map(|uuid| entries.by_uuid.get(uuid).cloned())
            .collect()
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<T>> {
        self.read().by_uuid.values().cloned().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.read().by_uuid.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn read(&self) -> RwLockReadGuard<'_, Entries<T>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries<T>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
