//! Facts — the typed relational triples of the graph.

use serde::{Deserialize, Serialize};
use super::Atom;

/// Truth polarity of a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Pos,
    Neg,
}

impl Polarity {
    pub fn flipped(self) -> Polarity {
        match self {
            Polarity::Pos => Polarity::Neg,
            Polarity::Neg => Polarity::Pos,
        }
    }
}

/// How a fact entered the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// Stated directly by a DSL `Assert`.
    Asserted,
    /// Produced by rule chaining or macro application.
    Derived,
    /// Produced by a typed default.
    Default,
}

/// Uniqueness key of a fact: `(subject, relation, object, polarity)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub subject: Atom,
    pub relation: Atom,
    pub object: Atom,
    pub polarity: Polarity,
}

impl FactKey {
    pub fn new(subject: Atom, relation: Atom, object: Atom, polarity: Polarity) -> Self {
        Self { subject, relation, object, polarity }
    }

    /// The same triple with opposite polarity — the contradiction probe.
    pub fn flipped(self) -> FactKey {
        FactKey { polarity: self.polarity.flipped(), ..self }
    }
}

/// A fact with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: Atom,
    pub relation: Atom,
    pub object: Atom,
    pub polarity: Polarity,
    pub source: Source,
}

impl Fact {
    pub fn new(subject: Atom, relation: Atom, object: Atom) -> Self {
        Self { subject, relation, object, polarity: Polarity::Pos, source: Source::Asserted }
    }

    pub fn with_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = source;
        self
    }

    pub fn key(&self) -> FactKey {
        FactKey::new(self.subject, self.relation, self.object, self.polarity)
    }
}
