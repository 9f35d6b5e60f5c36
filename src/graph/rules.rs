//! Rule and default stores.

use crate::model::{Atom, DefaultRule, Rule};
use crate::scope::journal::{Journal, JournalOp};

// ============================================================================
// RuleStore
// ============================================================================

/// Named horn rules, unique by name.
///
/// Firing order is priority descending, insertion sequence ascending.
#[derive(Debug, Default)]
pub struct RuleStore {
    by_name: hashbrown::HashMap<String, Rule>,
    order: Vec<String>,
    next_seq: u64,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.by_name.get(name)
    }

    /// Define (or redefine) a rule. Redefinition keeps the original
    /// insertion sequence so tie-breaks stay stable.
    pub fn define(&mut self, mut rule: Rule, journal: &mut Journal) {
        let prev = self.by_name.get(&rule.name).cloned();
        match &prev {
            Some(existing) => rule.seq = existing.seq,
            None => {
                rule.seq = self.next_seq;
                self.next_seq += 1;
                self.order.push(rule.name.clone());
            }
        }
        journal.record(JournalOp::RuleDefined { name: rule.name.clone(), prev });
        self.by_name.insert(rule.name.clone(), rule);
    }

    /// Rules in firing order, optionally filtered to heads on `relation`.
    pub fn ordered(&self, relation: Option<Atom>) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self
            .order
            .iter()
            .filter_map(|name| self.by_name.get(name))
            .filter(|rule| match relation {
                Some(rel) => match rule.head.relation.atom() {
                    Some(head_rel) => head_rel == rel,
                    // Variable-headed relation matches anything
                    None => true,
                },
                None => true,
            })
            .collect();
        rules.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        rules
    }

    pub(crate) fn restore(&mut self, name: &str, prev: Option<Rule>) {
        match prev {
            Some(rule) => {
                self.by_name.insert(name.to_owned(), rule);
            }
            None => {
                self.by_name.remove(name);
                self.order.retain(|n| n != name);
            }
        }
    }
}

// ============================================================================
// DefaultStore
// ============================================================================

/// Typed defaults, keyed by `(type, property)`.
#[derive(Debug, Default)]
pub struct DefaultStore {
    by_key: hashbrown::HashMap<(Atom, Atom), DefaultRule>,
    /// property → keys carrying it, in definition order (firing lookup).
    by_property: hashbrown::HashMap<Atom, Vec<(Atom, Atom)>>,
    next_seq: u64,
}

impl DefaultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    pub fn get(&self, ty: Atom, property: Atom) -> Option<&DefaultRule> {
        self.by_key.get(&(ty, property))
    }

    pub fn define(&mut self, mut default: DefaultRule, journal: &mut Journal) {
        let key = (default.ty, default.property);
        let prev = self.by_key.get(&key).cloned();
        match &prev {
            Some(existing) => default.seq = existing.seq,
            None => {
                default.seq = self.next_seq;
                self.next_seq += 1;
                self.by_property.entry(default.property).or_default().push(key);
            }
        }
        journal.record(JournalOp::DefaultDefined { ty: default.ty, property: default.property, prev });
        self.by_key.insert(key, default);
    }

    /// Defaults on `property`, in definition order.
    pub fn for_property(&self, property: Atom) -> Vec<&DefaultRule> {
        let mut defaults: Vec<&DefaultRule> = self
            .by_property
            .get(&property)
            .map(Vec::as_slice)
            .unwrap_or(&[])
            .iter()
            .filter_map(|key| self.by_key.get(key))
            .collect();
        defaults.sort_by_key(|d| d.seq);
        defaults
    }

    pub(crate) fn restore(&mut self, ty: Atom, property: Atom, prev: Option<DefaultRule>) {
        let key = (ty, property);
        match prev {
            Some(default) => {
                self.by_key.insert(key, default);
            }
            None => {
                self.by_key.remove(&key);
                if let Some(keys) = self.by_property.get_mut(&property) {
                    keys.retain(|k| k != &key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Interner, Polarity, Term, TriplePattern};
    use crate::scope::journal::Journal;

    fn pattern(interner: &mut Interner, s: &str, r: &str, o: &str) -> TriplePattern {
        let term = |t: &str, i: &mut Interner| match t.strip_prefix('?') {
            Some(v) => Term::Hole(v.to_owned()),
            None => Term::Atom(i.intern(t).unwrap()),
        };
        TriplePattern {
            subject: term(s, interner),
            relation: term(r, interner),
            object: term(o, interner),
            polarity: Polarity::Pos,
        }
    }

    #[test]
    fn test_rules_fire_by_priority_then_insertion() {
        let mut interner = Interner::new();
        let mut store = RuleStore::new();
        let mut journal = Journal::new();
        let head = pattern(&mut interner, "?x", "isA", "?z");
        let body = vec![pattern(&mut interner, "?x", "isA", "?y")];

        store.define(Rule::new("low", head.clone(), body.clone()), &mut journal);
        store.define(
            Rule::new("high", head.clone(), body.clone()).with_priority(5),
            &mut journal,
        );
        store.define(Rule::new("low2", head, body), &mut journal);

        let names: Vec<&str> = store.ordered(None).iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["high", "low", "low2"]);
    }

    #[test]
    fn test_redefine_keeps_sequence() {
        let mut interner = Interner::new();
        let mut store = RuleStore::new();
        let mut journal = Journal::new();
        let head = pattern(&mut interner, "?x", "isA", "?z");
        let body = vec![pattern(&mut interner, "?x", "isA", "?y")];
        store.define(Rule::new("r", head.clone(), body.clone()), &mut journal);
        let seq = store.get("r").unwrap().seq;
        store.define(Rule::new("r", head, body).with_priority(9), &mut journal);
        assert_eq!(store.get("r").unwrap().seq, seq);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_defaults_keyed_by_type_property() {
        let mut interner = Interner::new();
        let mut store = DefaultStore::new();
        let mut journal = Journal::new();
        let bird = interner.intern("bird").unwrap();
        let can_fly = interner.intern("canFly").unwrap();
        let yes = interner.intern("true").unwrap();

        store.define(DefaultRule::new("bird.canFly", bird, can_fly, yes), &mut journal);
        assert!(store.get(bird, can_fly).is_some());
        assert_eq!(store.for_property(can_fly).len(), 1);
    }
}
