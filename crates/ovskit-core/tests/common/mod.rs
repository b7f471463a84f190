#![allow(dead_code, clippy::unwrap_used)]

// In-memory OVSDB stand-in: executes transactions against a table map,
// enforces name uniqueness and reference integrity at commit, and pushes
// row diffs to the monitor like a real server would.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ovskit_api::{
    Atom, Condition, Error, Function, Monitor, Mutator, Operation, OperationResult, Row,
    RowUpdate, TableUpdates, Transport, Value,
};
use ovskit_core::{Switch, SwitchConfig};
use serde_json::{Value as Json, json};
use tokio::sync::{Notify, mpsc};
use uuid::Uuid;

pub const ROOT: &str = "Open_vSwitch";
const MIRRORED: [&str; 4] = [ROOT, "Bridge", "Port", "Interface"];
const UNIQUE_NAMES: [&str; 3] = ["Bridge", "Port", "Interface"];
const REFERENCES: [(&str, &str, &str); 4] = [
    (ROOT, "bridges", "Bridge"),
    ("Bridge", "ports", "Port"),
    ("Bridge", "controller", "Controller"),
    ("Port", "interfaces", "Interface"),
];

type Tables = BTreeMap<String, BTreeMap<Uuid, Row>>;

// ── Fake server ──────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeOvsdb {
    state: Arc<Mutex<State>>,
}

#[derive(Default)]
struct State {
    tables: Tables,
    monitor: Option<mpsc::UnboundedSender<TableUpdates>>,
    transactions: Vec<Vec<Operation>>,
    muted: bool,
    fail_next_write: Option<String>,
    time_out_next_write: Option<u64>,
    hold: Option<(String, Hold)>,
    closed: bool,
}

/// Parks the next write transaction touching a table until released.
#[derive(Clone, Default)]
pub struct Hold {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl FakeOvsdb {
    /// A database holding only the root row.
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state().tables.entry(ROOT.into()).or_default().insert(
            Uuid::new_v4(),
            Row::new()
                .with("bridges", Value::empty_set())
                .with("ovs_version", "3.3.0"),
        );
        fake
    }

    /// Insert a raw row outside any transaction.
    pub fn seed(&self, table: &str, row: Row) -> Uuid {
        let uuid = Uuid::new_v4();
        self.state()
            .tables
            .entry(table.into())
            .or_default()
            .insert(uuid, row);
        uuid
    }

    pub fn root_uuid(&self) -> Uuid {
        *self.state().tables[ROOT].keys().next().unwrap()
    }

    pub fn rows(&self, table: &str) -> Vec<(Uuid, Row)> {
        self.state()
            .tables
            .get(table)
            .map(|rows| rows.iter().map(|(k, v)| (*k, v.clone())).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.state().tables.get(table).map_or(0, BTreeMap::len)
    }

    pub fn find(&self, table: &str, name: &str) -> Option<(Uuid, Row)> {
        self.rows(table)
            .into_iter()
            .find(|(_, row)| row.get("name") == Some(&json!(name)))
    }

    /// Every transaction received, in order.
    pub fn transactions(&self) -> Vec<Vec<Operation>> {
        self.state().transactions.clone()
    }

    /// Transactions that contained at least one write.
    pub fn writes(&self) -> Vec<Vec<Operation>> {
        self.transactions()
            .into_iter()
            .filter(|ops| ops.iter().any(Operation::is_write))
            .collect()
    }

    /// Stop (or resume) pushing change notifications. Commits still land.
    pub fn set_muted(&self, muted: bool) {
        self.state().muted = muted;
    }

    /// Fail the next write transaction at its first operation.
    pub fn fail_next_write(&self, error: &str) {
        self.state().fail_next_write = Some(error.into());
    }

    /// Answer the next write transaction with a request timeout.
    pub fn time_out_next_write(&self, timeout_ms: u64) {
        self.state().time_out_next_write = Some(timeout_ms);
    }

    pub fn hold_next_write(&self, table: &str) -> Hold {
        let hold = Hold::default();
        self.state().hold = Some((table.into(), hold.clone()));
        hold
    }

    /// Push a raw notification to the monitor.
    pub fn push(&self, updates: TableUpdates) {
        if let Some(tx) = &self.state().monitor {
            let _ = tx.send(updates);
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn take_hold(&self, operations: &[Operation]) -> Option<Hold> {
        let mut state = self.state();
        let touches = state.hold.as_ref().is_some_and(|(table, _)| {
            operations
                .iter()
                .any(|op| op.is_write() && op.table() == table)
        });
        if touches {
            state.hold.take().map(|(_, hold)| hold)
        } else {
            None
        }
    }
}

impl Transport for FakeOvsdb {
    async fn transact(
        &self,
        _database: &str,
        operations: Vec<Operation>,
    ) -> Result<Vec<OperationResult>, Error> {
        if let Some(hold) = self.take_hold(&operations) {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        let mut state = self.state();
        if state.closed {
            return Err(Error::Disconnected);
        }
        state.transactions.push(operations.clone());

        if operations.iter().any(Operation::is_write) {
            if let Some(timeout_ms) = state.time_out_next_write.take() {
                return Err(Error::Timeout { timeout_ms });
            }
            if let Some(error) = state.fail_next_write.take() {
                return Ok(vec![OperationResult {
                    error: Some(error),
                    details: Some("injected failure".into()),
                    ..OperationResult::default()
                }]);
            }
        }

        let mut scratch = state.tables.clone();
        let results = match execute(&mut scratch, &operations) {
            Ok(results) => results,
            Err(aborted) => return Ok(aborted),
        };
        if let Err(error) = check_commit(&scratch) {
            let mut results = results;
            results.push(error);
            return Ok(results);
        }

        let diff = diff(&state.tables, &scratch);
        state.tables = scratch;
        match &state.monitor {
            Some(tx) if !diff.is_empty() && !state.muted => {
                let _ = tx.send(diff);
            }
            _ => {}
        }
        Ok(results)
    }

    async fn monitor(&self, _database: &str, tables: &[&str]) -> Result<Monitor, Error> {
        let mut state = self.state();
        if state.closed {
            return Err(Error::Disconnected);
        }
        let mut initial = TableUpdates::new();
        for table in tables {
            for (uuid, row) in state.tables.get(*table).into_iter().flatten() {
                initial.push(*table, *uuid, RowUpdate::insert(row.clone()));
            }
        }
        let (tx, updates) = mpsc::unbounded_channel();
        state.monitor = Some(tx);
        Ok(Monitor {
            id: "fake-monitor".into(),
            initial,
            updates,
        })
    }

    async fn disconnect(&self) {
        let mut state = self.state();
        state.closed = true;
        state.monitor = None;
    }
}

// ── Transaction execution ────────────────────────────────────────────

/// Run `operations` against `tables`. On failure returns the results up
/// to and including the failing operation.
fn execute(
    tables: &mut Tables,
    operations: &[Operation],
) -> Result<Vec<OperationResult>, Vec<OperationResult>> {
    // Named rows may be referenced before their insert runs.
    let named: HashMap<String, Uuid> = operations
        .iter()
        .filter_map(|op| match op {
            Operation::Insert {
                uuid_name: Some(name),
                ..
            } => Some((name.clone(), Uuid::new_v4())),
            _ => None,
        })
        .collect();

    let mut results = Vec::new();
    for op in operations {
        match run_one(tables, op, &named) {
            Ok(result) => results.push(result),
            Err(error) => {
                results.push(OperationResult {
                    error: Some("constraint violation".into()),
                    details: Some(error),
                    ..OperationResult::default()
                });
                return Err(results);
            }
        }
    }
    Ok(results)
}

fn run_one(
    tables: &mut Tables,
    op: &Operation,
    named: &HashMap<String, Uuid>,
) -> Result<OperationResult, String> {
    let mut raw = serde_json::to_value(op).unwrap();
    resolve_named(&mut raw, named)?;
    let op: Operation = serde_json::from_value(raw).unwrap();

    let result = match op {
        Operation::Insert {
            table,
            row,
            uuid_name,
        } => {
            let uuid = uuid_name
                .and_then(|n| named.get(&n).copied())
                .unwrap_or_else(Uuid::new_v4);
            tables.entry(table).or_default().insert(uuid, row);
            OperationResult {
                uuid: Some(uuid),
                ..OperationResult::default()
            }
        }
        Operation::Select {
            table, conditions, ..
        } => {
            let rows = matching(tables, &table, &conditions)
                .into_iter()
                .map(|uuid| tables[&table][&uuid].clone().with("_uuid", uuid))
                .collect();
            OperationResult {
                rows: Some(rows),
                ..OperationResult::default()
            }
        }
        Operation::Update {
            table,
            conditions,
            row,
        } => {
            let hits = matching(tables, &table, &conditions);
            for uuid in &hits {
                let target = tables.get_mut(&table).unwrap().get_mut(uuid).unwrap();
                for (column, value) in row.columns() {
                    target.insert(column.clone(), Value::from_json(value).unwrap());
                }
            }
            counted(hits.len())
        }
        Operation::Mutate {
            table,
            conditions,
            mutations,
        } => {
            let hits = matching(tables, &table, &conditions);
            for uuid in &hits {
                let target = tables.get_mut(&table).unwrap().get_mut(uuid).unwrap();
                for mutation in &mutations {
                    let mut atoms = column_atoms(target, &mutation.column);
                    let delta = mutation.value.atoms().map_err(|e| e.to_string())?;
                    match mutation.mutator {
                        Mutator::Insert => {
                            for atom in delta {
                                if !atoms.contains(atom) {
                                    atoms.push(atom.clone());
                                }
                            }
                        }
                        Mutator::Delete => atoms.retain(|a| !delta.contains(a)),
                        other => return Err(format!("unsupported mutator {other:?}")),
                    }
                    target.insert(mutation.column.clone(), Value::Set(atoms));
                }
            }
            counted(hits.len())
        }
        Operation::Delete { table, conditions } => {
            let hits = matching(tables, &table, &conditions);
            if let Some(rows) = tables.get_mut(&table) {
                for uuid in &hits {
                    rows.remove(uuid);
                }
            }
            counted(hits.len())
        }
    };
    Ok(result)
}

fn counted(count: usize) -> OperationResult {
    OperationResult {
        count: Some(u64::try_from(count).unwrap()),
        ..OperationResult::default()
    }
}

fn resolve_named(json: &mut Json, named: &HashMap<String, Uuid>) -> Result<(), String> {
    let substitute = match json {
        Json::Array(items) if items.len() == 2 && items[0] == "named-uuid" => {
            let name = items[1].as_str().unwrap_or_default();
            Some(
                *named
                    .get(name)
                    .ok_or_else(|| format!("unknown named-uuid {name}"))?,
            )
        }
        _ => None,
    };
    if let Some(uuid) = substitute {
        *json = json!(["uuid", uuid.to_string()]);
        return Ok(());
    }
    match json {
        Json::Array(items) => items.iter_mut().try_for_each(|i| resolve_named(i, named)),
        Json::Object(map) => map.values_mut().try_for_each(|v| resolve_named(v, named)),
        _ => Ok(()),
    }
}

fn matching(tables: &Tables, table: &str, conditions: &[Condition]) -> Vec<Uuid> {
    let Some(rows) = tables.get(table) else {
        return Vec::new();
    };
    rows.iter()
        .filter(|(uuid, row)| conditions.iter().all(|c| holds(**uuid, row, c)))
        .map(|(uuid, _)| *uuid)
        .collect()
}

fn holds(uuid: Uuid, row: &Row, condition: &Condition) -> bool {
    let actual = if condition.column == "_uuid" {
        vec![Atom::Uuid(uuid)]
    } else {
        column_atoms(row, &condition.column)
    };
    let wanted = condition.value.atoms().map(<[Atom]>::to_vec).unwrap_or_default();
    let includes = wanted.iter().all(|a| actual.contains(a));
    match condition.function {
        Function::Equal => includes && actual.len() == wanted.len(),
        Function::NotEqual => !(includes && actual.len() == wanted.len()),
        Function::Includes => includes,
        Function::Excludes => wanted.iter().all(|a| !actual.contains(a)),
    }
}

fn column_atoms(row: &Row, column: &str) -> Vec<Atom> {
    match row.value(column) {
        Some(Ok(value)) => value.atoms().map(<[Atom]>::to_vec).unwrap_or_default(),
        _ => Vec::new(),
    }
}

// ── Commit checks ────────────────────────────────────────────────────

fn check_commit(tables: &Tables) -> Result<(), OperationResult> {
    let violation = |error: &str, details: String| OperationResult {
        error: Some(error.into()),
        details: Some(details),
        ..OperationResult::default()
    };

    for table in UNIQUE_NAMES {
        let mut seen = HashSet::new();
        let names = tables
            .get(table)
            .into_iter()
            .flat_map(BTreeMap::values)
            .filter_map(|row| row.get("name"));
        for name in names {
            if !seen.insert(name.to_string()) {
                return Err(violation(
                    "constraint violation",
                    format!("duplicate {table} name {name}"),
                ));
            }
        }
    }

    for (table, column, target) in REFERENCES {
        for (uuid, row) in tables.get(table).into_iter().flatten() {
            for atom in column_atoms(row, column) {
                let Atom::Uuid(referenced) = atom else {
                    continue;
                };
                let exists = tables
                    .get(target)
                    .is_some_and(|rows| rows.contains_key(&referenced));
                if !exists {
                    return Err(violation(
                        "referential integrity violation",
                        format!("{table} {uuid} column {column} references missing {target} {referenced}"),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn diff(before: &Tables, after: &Tables) -> TableUpdates {
    let empty = BTreeMap::new();
    let mut updates = TableUpdates::new();
    for table in MIRRORED {
        let old = before.get(table).unwrap_or(&empty);
        let new = after.get(table).unwrap_or(&empty);
        for (uuid, row) in new {
            match old.get(uuid) {
                None => updates.push(table, *uuid, RowUpdate::insert(row.clone())),
                Some(prev) if prev != row => updates.push(
                    table,
                    *uuid,
                    RowUpdate {
                        old: Some(prev.clone()),
                        new: Some(row.clone()),
                    },
                ),
                Some(_) => {}
            }
        }
        for (uuid, row) in old {
            if !new.contains_key(uuid) {
                updates.push(table, *uuid, RowUpdate::tombstone(Some(row.clone())));
            }
        }
    }
    updates
}

// ── Helpers ──────────────────────────────────────────────────────────

pub const SETTLE: Duration = Duration::from_secs(2);

pub async fn connect(fake: &FakeOvsdb) -> Switch<FakeOvsdb> {
    Switch::with_transport(fake.clone(), SwitchConfig::default())
        .await
        .unwrap()
}

/// Wait for the cache to observe `predicate`, failing the test otherwise.
pub async fn settle<F>(switch: &Switch<FakeOvsdb>, predicate: F)
where
    F: FnMut(&ovskit_core::DataStore) -> bool,
{
    assert!(
        switch.store().wait_until(SETTLE, predicate).await,
        "cache did not converge within {SETTLE:?}"
    );
}
