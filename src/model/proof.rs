//! Proof steps — the provenance trail attached to every answer.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{Fact, Interner};

/// How a conclusion was derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Method {
    /// Direct hit in the primary fact index.
    Exact,
    /// Rule chaining; carries the rule name.
    Rule(String),
    /// Typed default firing; carries the default name.
    Default(String),
    /// Vector decode + cleanup.
    Holographic,
    /// Hypothesis adopted to close a proof gap.
    Abduced,
}

impl Method {
    /// Ranking order for result sorting: `exact > rule > default > holographic`.
    pub fn rank(&self) -> u8 {
        match self {
            Method::Exact => 0,
            Method::Rule(_) => 1,
            Method::Default(_) => 2,
            Method::Holographic => 3,
            Method::Abduced => 4,
        }
    }

    pub fn tag(&self) -> String {
        match self {
            Method::Exact => "exact".into(),
            Method::Rule(n) => format!("rule({n})"),
            Method::Default(n) => format!("default({n})"),
            Method::Holographic => "holographic".into(),
            Method::Abduced => "abduced".into(),
        }
    }
}

/// One step of a proof: a conclusion, the method that produced it, and the
/// premises it rests on. Holographic steps carry the top-1 similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofStep {
    pub conclusion: Fact,
    pub method: Method,
    pub premises: SmallVec<[Fact; 4]>,
    pub similarity: Option<f32>,
}

impl ProofStep {
    pub fn exact(conclusion: Fact) -> Self {
        Self { conclusion, method: Method::Exact, premises: SmallVec::new(), similarity: None }
    }

    pub fn rule(conclusion: Fact, rule_name: &str, premises: Vec<Fact>) -> Self {
        Self {
            conclusion,
            method: Method::Rule(rule_name.to_owned()),
            premises: premises.into(),
            similarity: None,
        }
    }

    pub fn default(conclusion: Fact, default_name: &str, premises: Vec<Fact>) -> Self {
        Self {
            conclusion,
            method: Method::Default(default_name.to_owned()),
            premises: premises.into(),
            similarity: None,
        }
    }

    pub fn holographic(conclusion: Fact, similarity: f32) -> Self {
        Self {
            conclusion,
            method: Method::Holographic,
            premises: SmallVec::new(),
            similarity: Some(similarity),
        }
    }

    pub fn render(&self, interner: &Interner) -> String {
        let fact = |f: &Fact| {
            format!(
                "({} {} {})",
                interner.name(f.subject),
                interner.name(f.relation),
                interner.name(f.object)
            )
        };
        let mut line = format!("{} [{}]", fact(&self.conclusion), self.method.tag());
        if let Some(sim) = self.similarity {
            line.push_str(&format!(" sim={sim:.3}"));
        }
        if !self.premises.is_empty() {
            let premises: Vec<String> = self.premises.iter().map(|p| fact(p)).collect();
            line.push_str(&format!(" ⟸ {}", premises.join(", ")));
        }
        line
    }
}
