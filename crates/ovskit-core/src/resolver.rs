// ── Named-row references ──
//
// A row inserted in a transaction has no UUID until commit. Each new row
// gets a transaction-scoped symbol instead; sibling operations refer to
// it with `["named-uuid", symbol]` and the server substitutes the real key.

use std::collections::HashMap;

use ovskit_api::{Atom, Value};

use crate::model::Table;

/// Placeholder for the key of a row inserted in the current transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reference to this row, for use in any column of a sibling row.
    pub fn reference(&self) -> Value {
        Value::Atom(self.atom())
    }

    /// Reference to this row as a one-element set, for `mutate`.
    pub fn reference_set(&self) -> Value {
        Value::set([self.atom()])
    }

    /// The `uuid-name` to attach to the `insert` that creates the row.
    pub fn uuid_name(&self) -> String {
        self.0.clone()
    }

    fn atom(&self) -> Atom {
        Atom::NamedUuid(self.0.clone())
    }
}

/// Symbol allocator for one transaction. Never reuse across transactions.
#[derive(Debug, Default)]
pub struct NamedRefs {
    counters: HashMap<Table, usize>,
}

impl NamedRefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh symbol for a new row of `table`, e.g. `row_port0`.
    pub fn new_symbol(&mut self, table: Table) -> Symbol {
        let n = self.counters.entry(table).or_insert(0);
        let symbol = format!("row_{}{n}", table.name().to_ascii_lowercase());
        *n += 1;
        Symbol(symbol)
    }
}
