//! Answer records returned by the session façade.

use serde::{Deserialize, Serialize};

use super::{Atom, Method, ProofStep};

/// A bound answer for one hole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub answer: Option<Atom>,
    pub method: Method,
    pub similarity: Option<f32>,
    pub steps: Vec<ProofStep>,
}

/// One complete solution for a query goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Hole name → bound atom.
    pub bindings: hashbrown::HashMap<String, Atom>,
    pub method: Method,
    pub similarity: Option<f32>,
    pub steps: Vec<ProofStep>,
}

impl Solution {
    /// Sort key: method priority first, then similarity descending, then the
    /// answer atoms for a stable total order.
    pub fn rank_key(&self) -> (u8, i64, Vec<Atom>) {
        let sim_rank = match self.similarity {
            // Negated fixed-point so that higher similarity sorts first.
            Some(s) => -((s * 1_000_000.0) as i64),
            None => i64::MIN,
        };
        let mut atoms: Vec<Atom> = self.bindings.values().copied().collect();
        atoms.sort();
        (self.method.rank(), sim_rank, atoms)
    }
}

/// Result of `Session::query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryReport {
    pub success: bool,
    /// Best binding per hole (from the top-ranked solution).
    pub bindings: hashbrown::HashMap<String, Binding>,
    pub all_results: Vec<Solution>,
    /// Losing-branch holographic similarity, attached for telemetry.
    pub holographic_confidence: Option<f32>,
    pub reasoning_stats: ReasoningStats,
}

/// Result of `Session::prove`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProveReport {
    pub valid: bool,
    pub proof: Option<Vec<ProofStep>>,
    pub method: Option<Method>,
    /// Holographic confidence attached for telemetry when both branches ran.
    pub holographic_confidence: Option<f32>,
    pub reasoning_stats: ReasoningStats,
}

/// Result of `Session::learn`.
#[derive(Debug, Clone, Default)]
pub struct LearnOutcome {
    pub success: bool,
    pub facts_added: usize,
    pub scope_bound: usize,
    pub rules_defined: usize,
    pub defaults_defined: usize,
    /// Recoverable errors recorded without aborting the call.
    pub errors: Vec<crate::Error>,
}

/// Cumulative reasoning counters, additive until `reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningStats {
    pub similarity_checks: u64,
    pub rule_firings: u64,
    pub default_firings: u64,
    pub holographic_decodes: u64,
    pub exact_unbind_checks: u64,
    pub exact_unbind_out_terms: u64,
    pub facts_asserted: u64,
    pub facts_retracted: u64,
    pub contradictions: u64,
}

impl ReasoningStats {
    /// Fold another counter block into this one.
    pub fn absorb(&mut self, other: &ReasoningStats) {
        self.similarity_checks += other.similarity_checks;
        self.rule_firings += other.rule_firings;
        self.default_firings += other.default_firings;
        self.holographic_decodes += other.holographic_decodes;
        self.exact_unbind_checks += other.exact_unbind_checks;
        self.exact_unbind_out_terms += other.exact_unbind_out_terms;
        self.facts_asserted += other.facts_asserted;
        self.facts_retracted += other.facts_retracted;
        self.contradictions += other.contradictions;
    }
}
