//! # Scope & Transactions
//!
//! Per-session named bindings for DSL `@name` destinations, and the journal
//! that makes every top-level `learn`/`query`/`prove` call atomic.
//!
//! A scope entry may carry a persist marker (`@name:persistName`); persistent
//! entries survive transaction rollback at the session level, everything else
//! is transaction-local.

pub mod journal;

use crate::hdc::Vector;

pub use journal::{Journal, JournalOp, Snapshot};

/// One named binding.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeEntry {
    pub vector: Vector,
    /// Session-level persist name, when flagged to survive rollback.
    pub persist: Option<String>,
}

/// Name → vector map with stable insertion order.
#[derive(Debug, Default)]
pub struct Scope {
    entries: hashbrown::HashMap<String, ScopeEntry>,
    order: Vec<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ScopeEntry> {
        self.entries.get(name)
    }

    /// Bind a name, journaling the previous entry for rollback.
    pub fn set(
        &mut self,
        name: &str,
        vector: Vector,
        persist: Option<String>,
        journal: &mut Journal,
    ) {
        let prev = self.entries.get(name).cloned();
        if prev.is_none() {
            self.order.push(name.to_owned());
        }
        journal.record(JournalOp::ScopeSet {
            name: name.to_owned(),
            prev,
            persist: persist.is_some(),
        });
        self.entries
            .insert(name.to_owned(), ScopeEntry { vector, persist });
    }

    /// Entries in binding order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ScopeEntry)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|e| (name.as_str(), e)))
    }

    pub(crate) fn restore(&mut self, name: &str, prev: Option<ScopeEntry>) {
        match prev {
            Some(entry) => {
                self.entries.insert(name.to_owned(), entry);
            }
            None => {
                self.entries.remove(name);
                self.order.retain(|n| n != name);
            }
        }
    }
}
