//! Goals — triples (or wider operator tuples) with holes.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Atom, Interner};

/// One slot of a goal or pattern: a concrete atom or a named hole (`?x`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Atom(Atom),
    Hole(String),
}

impl Term {
    pub fn is_hole(&self) -> bool {
        matches!(self, Term::Hole(_))
    }

    pub fn atom(&self) -> Option<Atom> {
        match self {
            Term::Atom(a) => Some(*a),
            Term::Hole(_) => None,
        }
    }

    pub fn hole_name(&self) -> Option<&str> {
        match self {
            Term::Hole(n) => Some(n),
            Term::Atom(_) => None,
        }
    }
}

/// A goal: an operator (relation) applied to argument slots.
///
/// Arity 2 is the classic triple `(subject, relation, object)` that the
/// symbolic kernel chains over; wider tuples exist only in the holographic
/// layer (operator slot 0, args 1..n).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub relation: Term,
    pub args: SmallVec<[Term; 3]>,
    /// Preferred answer hole for queries; defaults to the first hole.
    pub answer_hole: Option<String>,
}

/// Unresolved goal as it leaves the parser — names, not atoms.
///
/// `?`-prefixed tokens become holes; everything else is an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalSpec {
    pub relation: String,
    pub args: Vec<String>,
    pub answer_hole: Option<String>,
}

impl Goal {
    /// Classic triple goal from parser-facing tokens. `?`-prefixed tokens
    /// become holes. Atoms are carried as a spec and interned on execution.
    pub fn triple(subject: &str, relation: &str, object: &str) -> GoalSpec {
        GoalSpec {
            relation: relation.to_owned(),
            args: vec![subject.to_owned(), object.to_owned()],
            answer_hole: None,
        }
    }

    /// N-ary operator goal (holographic layer).
    pub fn tuple(relation: &str, args: &[&str]) -> GoalSpec {
        GoalSpec {
            relation: relation.to_owned(),
            args: args.iter().map(|s| (*s).to_owned()).collect(),
            answer_hole: None,
        }
    }

    pub fn is_triple(&self) -> bool {
        self.args.len() == 2
    }

    pub fn subject(&self) -> &Term {
        &self.args[0]
    }

    pub fn object(&self) -> &Term {
        &self.args[1]
    }

    /// Names of all holes, in slot order (relation slot first).
    pub fn holes(&self) -> Vec<&str> {
        let mut out = Vec::new();
        if let Term::Hole(n) = &self.relation {
            out.push(n.as_str());
        }
        for arg in &self.args {
            if let Term::Hole(n) = arg {
                out.push(n.as_str());
            }
        }
        out
    }

    pub fn is_ground(&self) -> bool {
        self.holes().is_empty()
    }

    /// The hole the query should answer: the designated one, else the first.
    pub fn answer_hole_name(&self) -> Option<&str> {
        match &self.answer_hole {
            Some(n) => Some(n.as_str()),
            None => self.holes().first().copied(),
        }
    }

    /// Render for logs and proofs.
    pub fn render(&self, interner: &Interner) -> String {
        let slot = |t: &Term| match t {
            Term::Atom(a) => interner.name(*a).to_owned(),
            Term::Hole(n) => format!("?{n}"),
        };
        let args: Vec<String> = self.args.iter().map(slot).collect();
        format!("{}({})", slot(&self.relation), args.join(", "))
    }
}

impl GoalSpec {
    /// Designate the answer hole (must be one of the `?`-prefixed tokens).
    pub fn with_answer_hole(mut self, hole: &str) -> Self {
        self.answer_hole = Some(hole.trim_start_matches('?').to_owned());
        self
    }

    /// Intern identifiers and split holes, producing an executable goal.
    pub fn resolve(&self, interner: &mut Interner) -> crate::Result<Goal> {
        let term = |tok: &str, interner: &mut Interner| -> crate::Result<Term> {
            match tok.strip_prefix('?') {
                Some(hole) => Ok(Term::Hole(hole.to_owned())),
                None => Ok(Term::Atom(interner.intern(tok)?)),
            }
        };
        let relation = term(&self.relation, interner)?;
        let mut args: SmallVec<[Term; 3]> = SmallVec::new();
        for a in &self.args {
            args.push(term(a, interner)?);
        }
        Ok(Goal { relation, args, answer_hole: self.answer_hole.clone() })
    }
}
