//! Transaction journal.
//!
//! Every journaled mutation appends one reversible op. A snapshot is just a
//! mark into the op list; rollback undoes ops in reverse order until the
//! mark, skipping persistent scope bindings. Nested calls (macro expansion,
//! sub-program loads) share the outer transaction — there are no savepoints
//! inside a top-level call.

use crate::graph::{FactGraph, FactMeta, Premises, RuleStore, DefaultStore};
use crate::model::{Atom, DefaultRule, Fact, FactKey, Rule};
use crate::scope::{Scope, ScopeEntry};

/// One reversible mutation.
#[derive(Debug, Clone)]
pub enum JournalOp {
    FactAdded { key: FactKey },
    FactRemoved { fact: Fact, meta: FactMeta },
    DerivationAdded { key: FactKey, premises: Premises },
    DerivationRemoved { key: FactKey, premises: Premises },
    ScopeSet { name: String, prev: Option<ScopeEntry>, persist: bool },
    RuleDefined { name: String, prev: Option<Rule> },
    DefaultDefined { ty: Atom, property: Atom, prev: Option<DefaultRule> },
}

/// Snapshot of the journal at transaction begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot(usize);

/// The session's single mutation journal.
#[derive(Debug, Default)]
pub struct Journal {
    ops: Vec<JournalOp>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Open a transaction: capture the current mark.
    pub fn begin(&self) -> Snapshot {
        Snapshot(self.ops.len())
    }

    pub fn record(&mut self, op: JournalOp) {
        self.ops.push(op);
    }

    /// Commit: ops before the mark become permanent; nothing to undo.
    /// The tail is retained so an enclosing transaction can still roll back.
    pub fn commit(&mut self, _snapshot: Snapshot) {}

    /// Undo every op after the snapshot, newest first.
    ///
    /// Persistent scope bindings are deliberately kept.
    pub fn rollback(
        &mut self,
        snapshot: Snapshot,
        graph: &mut FactGraph,
        scope: &mut Scope,
        rules: &mut RuleStore,
        defaults: &mut DefaultStore,
    ) {
        while self.ops.len() > snapshot.0 {
            let Some(op) = self.ops.pop() else { break };
            match op {
                JournalOp::FactAdded { key } => {
                    graph.remove_raw(&key);
                }
                JournalOp::FactRemoved { fact, meta } => {
                    graph.insert_raw(fact.key(), meta);
                }
                JournalOp::DerivationAdded { key, premises } => {
                    graph.remove_derivation_raw(key, &premises);
                }
                JournalOp::DerivationRemoved { key, premises } => {
                    graph.add_derivation_raw(key, premises);
                }
                JournalOp::ScopeSet { name, prev, persist } => {
                    if !persist {
                        scope.restore(&name, prev);
                    }
                }
                JournalOp::RuleDefined { name, prev } => {
                    rules.restore(&name, prev);
                }
                JournalOp::DefaultDefined { ty, property, prev } => {
                    defaults.restore(ty, property, prev);
                }
            }
        }
    }
}
