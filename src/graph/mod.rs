//! # Fact Graph
//!
//! In-memory store of typed relational facts with eager secondary indices.
//!
//! - Primary index: `(subject, relation, object, polarity)` → metadata
//! - Secondary indices: by subject, by relation, by (relation, object)
//!
//! Every insertion and removal keeps the indices coherent, and every
//! mutation is journaled so the transaction layer can roll it back.
//! Derived facts track their premise sets; retracting a premise cascades
//! through derived facts that lose their last surviving derivation.

pub mod rules;

use smallvec::SmallVec;

use crate::model::{Atom, Fact, FactKey, Interner, Polarity, Source};
use crate::scope::journal::{Journal, JournalOp};
use crate::{Error, Result};

pub use rules::{DefaultStore, RuleStore};

/// Premise set for one derivation of a fact.
pub type Premises = SmallVec<[FactKey; 4]>;

/// Metadata carried by every stored fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactMeta {
    pub source: Source,
    /// One entry per known derivation; empty for asserted facts.
    pub derivations: Vec<Premises>,
}

/// Outcome of an assert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asserted {
    Added,
    Duplicate,
}

// ============================================================================
// FactGraph
// ============================================================================

#[derive(Debug, Default)]
pub struct FactGraph {
    primary: hashbrown::HashMap<FactKey, FactMeta>,
    by_subject: hashbrown::HashMap<Atom, Vec<FactKey>>,
    by_relation: hashbrown::HashMap<Atom, Vec<FactKey>>,
    by_rel_obj: hashbrown::HashMap<(Atom, Atom), Vec<FactKey>>,
    /// premise key → derived facts that cite it.
    dependents: hashbrown::HashMap<FactKey, Vec<FactKey>>,
}

impl FactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primary.is_empty()
    }

    pub fn contains(&self, key: &FactKey) -> bool {
        self.primary.contains_key(key)
    }

    pub fn meta(&self, key: &FactKey) -> Option<&FactMeta> {
        self.primary.get(key)
    }

    /// Reconstruct the full fact for a stored key.
    pub fn fact(&self, key: &FactKey) -> Option<Fact> {
        self.primary.get(key).map(|meta| Fact {
            subject: key.subject,
            relation: key.relation,
            object: key.object,
            polarity: key.polarity,
            source: meta.source,
        })
    }

    pub fn by_subject(&self, subject: Atom) -> &[FactKey] {
        self.by_subject.get(&subject).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_relation(&self, relation: Atom) -> &[FactKey] {
        self.by_relation.get(&relation).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn by_rel_obj(&self, relation: Atom, object: Atom) -> &[FactKey] {
        self.by_rel_obj
            .get(&(relation, object))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All keys, in no particular order (callers sort when order matters).
    pub fn keys(&self) -> impl Iterator<Item = &FactKey> {
        self.primary.keys()
    }

    /// Does any fact (either polarity) exist on `(subject, relation, *)`?
    pub fn has_property_fact(&self, subject: Atom, relation: Atom) -> bool {
        self.by_subject(subject).iter().any(|k| k.relation == relation)
    }

    // ========================================================================
    // Mutation (journaled)
    // ========================================================================

    /// Assert a fact.
    ///
    /// - Opposite-polarity fact present → `Kind::Contradiction` (the caller
    ///   decides whether to reject or tolerate).
    /// - Duplicate → no-op, except that a new premise set on a derived fact
    ///   is recorded as an additional derivation.
    /// - New → primary + secondary indices + journal.
    pub fn assert_fact(
        &mut self,
        fact: Fact,
        premises: &[FactKey],
        journal: &mut Journal,
        interner: &Interner,
    ) -> Result<Asserted> {
        let key = fact.key();
        if self.primary.contains_key(&key.flipped()) {
            return Err(Error::Contradiction {
                subject: interner.name(key.subject).to_owned(),
                relation: interner.name(key.relation).to_owned(),
                object: interner.name(key.object).to_owned(),
            });
        }

        if let Some(meta) = self.primary.get_mut(&key) {
            let premises: Premises = premises.into();
            if !premises.is_empty() && !meta.derivations.contains(&premises) {
                meta.derivations.push(premises.clone());
                for p in &premises {
                    self.dependents.entry(*p).or_default().push(key);
                }
                journal.record(JournalOp::DerivationAdded { key, premises });
            }
            return Ok(Asserted::Duplicate);
        }

        let derivations = if premises.is_empty() {
            Vec::new()
        } else {
            vec![premises.into()]
        };
        let meta = FactMeta { source: fact.source, derivations };
        self.insert_raw(key, meta);
        journal.record(JournalOp::FactAdded { key });
        Ok(Asserted::Added)
    }

    /// Remove both polarities of `(s, r, o)` and cascade through derived
    /// facts whose last derivation disappears. Returns removed-fact count.
    pub fn retract(
        &mut self,
        subject: Atom,
        relation: Atom,
        object: Atom,
        journal: &mut Journal,
    ) -> usize {
        let mut removed = 0;
        for polarity in [Polarity::Pos, Polarity::Neg] {
            let key = FactKey::new(subject, relation, object, polarity);
            removed += self.remove_cascading(key, journal);
        }
        removed
    }

    fn remove_cascading(&mut self, key: FactKey, journal: &mut Journal) -> usize {
        let Some(meta) = self.primary.get(&key).cloned() else {
            return 0;
        };
        let fact = Fact {
            subject: key.subject,
            relation: key.relation,
            object: key.object,
            polarity: key.polarity,
            source: meta.source,
        };
        self.remove_raw(&key);
        journal.record(JournalOp::FactRemoved { fact, meta });

        let mut removed = 1;
        let dependents = self.dependents.remove(&key).unwrap_or_default();
        for dep in dependents {
            let Some(dep_meta) = self.primary.get_mut(&dep) else {
                continue;
            };
            let (kept, dropped): (Vec<Premises>, Vec<Premises>) = dep_meta
                .derivations
                .drain(..)
                .partition(|premises| !premises.contains(&key));
            dep_meta.derivations = kept;
            let orphaned = dep_meta.derivations.is_empty();
            for premises in dropped {
                journal.record(JournalOp::DerivationRemoved { key: dep, premises });
            }
            if orphaned {
                removed += self.remove_cascading(dep, journal);
            }
        }
        removed
    }

    // ========================================================================
    // Raw mutation (rollback path — not journaled)
    // ========================================================================

    pub(crate) fn insert_raw(&mut self, key: FactKey, meta: FactMeta) {
        for premises in &meta.derivations {
            for p in premises {
                self.dependents.entry(*p).or_default().push(key);
            }
        }
        self.by_subject.entry(key.subject).or_default().push(key);
        self.by_relation.entry(key.relation).or_default().push(key);
        self.by_rel_obj
            .entry((key.relation, key.object))
            .or_default()
            .push(key);
        self.primary.insert(key, meta);
    }

    pub(crate) fn remove_raw(&mut self, key: &FactKey) {
        let Some(meta) = self.primary.remove(key) else {
            return;
        };
        for premises in &meta.derivations {
            for p in premises {
                if let Some(deps) = self.dependents.get_mut(p) {
                    deps.retain(|d| d != key);
                }
            }
        }
        if let Some(keys) = self.by_subject.get_mut(&key.subject) {
            keys.retain(|k| k != key);
        }
        if let Some(keys) = self.by_relation.get_mut(&key.relation) {
            keys.retain(|k| k != key);
        }
        if let Some(keys) = self.by_rel_obj.get_mut(&(key.relation, key.object)) {
            keys.retain(|k| k != key);
        }
    }

    pub(crate) fn add_derivation_raw(&mut self, key: FactKey, premises: Premises) {
        for p in &premises {
            self.dependents.entry(*p).or_default().push(key);
        }
        if let Some(meta) = self.primary.get_mut(&key) {
            meta.derivations.push(premises);
        }
    }

    pub(crate) fn remove_derivation_raw(&mut self, key: FactKey, premises: &Premises) {
        for p in premises {
            if let Some(deps) = self.dependents.get_mut(p) {
                if let Some(pos) = deps.iter().position(|d| d == &key) {
                    deps.remove(pos);
                }
            }
        }
        if let Some(meta) = self.primary.get_mut(&key) {
            if let Some(pos) = meta.derivations.iter().position(|d| d == premises) {
                meta.derivations.remove(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::journal::Journal;

    fn setup() -> (FactGraph, Journal, Interner, Atom, Atom, Atom, Atom) {
        let mut interner = Interner::new();
        let dog = interner.intern("dog").unwrap();
        let is_a = interner.intern("isA").unwrap();
        let mammal = interner.intern("mammal").unwrap();
        let animal = interner.intern("animal").unwrap();
        (FactGraph::new(), Journal::new(), interner, dog, is_a, mammal, animal)
    }

    #[test]
    fn test_assert_maintains_all_indices() {
        let (mut graph, mut journal, interner, dog, is_a, mammal, _) = setup();
        graph
            .assert_fact(Fact::new(dog, is_a, mammal), &[], &mut journal, &interner)
            .unwrap();
        let key = FactKey::new(dog, is_a, mammal, Polarity::Pos);
        assert!(graph.contains(&key));
        assert_eq!(graph.by_subject(dog), &[key]);
        assert_eq!(graph.by_relation(is_a), &[key]);
        assert_eq!(graph.by_rel_obj(is_a, mammal), &[key]);
    }

    #[test]
    fn test_duplicate_assert_is_noop() {
        let (mut graph, mut journal, interner, dog, is_a, mammal, _) = setup();
        let fact = Fact::new(dog, is_a, mammal);
        assert_eq!(
            graph.assert_fact(fact.clone(), &[], &mut journal, &interner).unwrap(),
            Asserted::Added
        );
        assert_eq!(
            graph.assert_fact(fact, &[], &mut journal, &interner).unwrap(),
            Asserted::Duplicate
        );
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_opposite_polarity_is_contradiction() {
        let (mut graph, mut journal, interner, dog, is_a, mammal, _) = setup();
        graph
            .assert_fact(Fact::new(dog, is_a, mammal), &[], &mut journal, &interner)
            .unwrap();
        let err = graph
            .assert_fact(
                Fact::new(dog, is_a, mammal).with_polarity(Polarity::Neg),
                &[],
                &mut journal,
                &interner,
            )
            .unwrap_err();
        assert_eq!(err.kind(), crate::Kind::Contradiction);
    }

    #[test]
    fn test_retract_cascades_through_derived_facts() {
        let (mut graph, mut journal, interner, dog, is_a, mammal, animal) = setup();
        let base = Fact::new(dog, is_a, mammal);
        graph.assert_fact(base.clone(), &[], &mut journal, &interner).unwrap();
        let mid = Fact::new(mammal, is_a, animal);
        graph.assert_fact(mid.clone(), &[], &mut journal, &interner).unwrap();
        // dog isA animal, derived from the two above
        let derived = Fact::new(dog, is_a, animal).with_source(Source::Derived);
        graph
            .assert_fact(derived, &[base.key(), mid.key()], &mut journal, &interner)
            .unwrap();
        assert_eq!(graph.len(), 3);

        let removed = graph.retract(dog, is_a, mammal, &mut journal);
        assert_eq!(removed, 2, "premise and its dependent should both go");
        assert_eq!(graph.len(), 1);
        assert!(!graph.contains(&FactKey::new(dog, is_a, animal, Polarity::Pos)));
    }

    #[test]
    fn test_derived_fact_survives_while_one_derivation_holds() {
        let (mut graph, mut journal, interner, dog, is_a, mammal, animal) = setup();
        let a = Fact::new(dog, is_a, mammal);
        let b = Fact::new(mammal, is_a, animal);
        graph.assert_fact(a.clone(), &[], &mut journal, &interner).unwrap();
        graph.assert_fact(b.clone(), &[], &mut journal, &interner).unwrap();
        let derived = Fact::new(dog, is_a, animal).with_source(Source::Derived);
        // Two independent derivations of the same conclusion
        graph
            .assert_fact(derived.clone(), &[a.key()], &mut journal, &interner)
            .unwrap();
        graph
            .assert_fact(derived, &[b.key()], &mut journal, &interner)
            .unwrap();

        graph.retract(dog, is_a, mammal, &mut journal);
        // The second derivation still holds
        assert!(graph.contains(&FactKey::new(dog, is_a, animal, Polarity::Pos)));
    }
}
