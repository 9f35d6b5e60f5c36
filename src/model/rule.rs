//! Horn-like rules and typed defaults.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Atom, Polarity, Term, Interner};

/// A triple pattern with variables permitted in any slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: Term,
    pub relation: Term,
    pub object: Term,
    pub polarity: Polarity,
}

impl TriplePattern {
    pub fn new(subject: Term, relation: Term, object: Term) -> Self {
        Self { subject, relation, object, polarity: Polarity::Pos }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Variable names in slot order, first occurrence only.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for term in [&self.subject, &self.relation, &self.object] {
            if let Term::Hole(n) = term {
                if !out.contains(&n.as_str()) {
                    out.push(n.as_str());
                }
            }
        }
        out
    }

    pub fn is_ground(&self) -> bool {
        !self.subject.is_hole() && !self.relation.is_hole() && !self.object.is_hole()
    }

    pub fn render(&self, interner: &Interner) -> String {
        let slot = |t: &Term| match t {
            Term::Atom(a) => interner.name(*a).to_owned(),
            Term::Hole(n) => format!("?{n}"),
        };
        let neg = if self.polarity == Polarity::Neg { "not " } else { "" };
        format!(
            "{neg}({} {} {})",
            slot(&self.subject),
            slot(&self.relation),
            slot(&self.object)
        )
    }
}

/// A named horn rule: `head ⟸ body₁, …, bodyₙ`.
///
/// Higher priority fires first; ties break by insertion sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub head: TriplePattern,
    pub body: SmallVec<[TriplePattern; 4]>,
    pub priority: i32,
    /// Insertion sequence number, assigned by the rule store.
    pub seq: u64,
}

impl Rule {
    pub fn new(name: &str, head: TriplePattern, body: Vec<TriplePattern>) -> Self {
        Self {
            name: name.to_owned(),
            head,
            body: body.into(),
            priority: 0,
            seq: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Head variables in first-occurrence order — the macro argument slots.
    pub fn head_variables(&self) -> Vec<&str> {
        self.head.variables()
    }
}

/// A typed default: `subject property value` holds for every `subject isA
/// type` unless `subject` is excepted or an explicit fact on
/// `(subject, property, *)` already exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRule {
    pub name: String,
    pub ty: Atom,
    pub property: Atom,
    pub value: Atom,
    pub exceptions: SmallVec<[Atom; 4]>,
    pub seq: u64,
}

impl DefaultRule {
    pub fn new(name: &str, ty: Atom, property: Atom, value: Atom) -> Self {
        Self {
            name: name.to_owned(),
            ty,
            property,
            value,
            exceptions: SmallVec::new(),
            seq: 0,
        }
    }

    pub fn with_exceptions(mut self, exceptions: impl IntoIterator<Item = Atom>) -> Self {
        self.exceptions = exceptions.into_iter().collect();
        self
    }

    pub fn excepts(&self, subject: Atom) -> bool {
        self.exceptions.contains(&subject)
    }
}
