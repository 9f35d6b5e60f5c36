//! Typed session options.
//!
//! One record with a closed field set replaces the ad-hoc string
//! dictionaries of older engines; unknown knobs simply do not exist here.

use serde::{Deserialize, Serialize};

use crate::hdc::Strategy;

pub use crate::hdc::exact::UnbindMode as ExactUnbindMode;
pub use crate::reason::arbiter::ReasoningPriority;

/// Named reasoning profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReasoningProfile {
    /// Theory first: symbolic priority unless overridden.
    #[default]
    TheoryDriven,
    /// Association first: defaults the priority to holographic.
    Associative,
}

impl ReasoningProfile {
    pub fn parse(name: &str) -> Option<ReasoningProfile> {
        match name {
            "theoryDriven" => Some(ReasoningProfile::TheoryDriven),
            "associative" => Some(ReasoningProfile::Associative),
            _ => None,
        }
    }
}

/// Session construction options (the recognized field set, nothing more).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Codec geometry; 0 selects the strategy default.
    pub geometry: usize,
    pub hdc_strategy: Strategy,
    /// `None` defers to the profile's preference.
    pub reasoning_priority: Option<ReasoningPriority>,
    pub reasoning_profile: ReasoningProfile,
    pub closed_world_assumption: bool,
    pub reject_contradictions: bool,
    /// Exact codec only; ignored by the statistical codecs.
    pub exact_unbind_mode: ExactUnbindMode,
    pub depth_limit: usize,
    pub timeout_ms: Option<u64>,
    pub seed: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            geometry: 0,
            hdc_strategy: Strategy::DenseBinary,
            reasoning_priority: None,
            reasoning_profile: ReasoningProfile::TheoryDriven,
            closed_world_assumption: false,
            reject_contradictions: true,
            exact_unbind_mode: ExactUnbindMode::A,
            depth_limit: 16,
            timeout_ms: None,
            seed: 0,
        }
    }
}

impl SessionOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.hdc_strategy = strategy;
        self
    }

    pub fn with_geometry(mut self, geometry: usize) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_priority(mut self, priority: ReasoningPriority) -> Self {
        self.reasoning_priority = Some(priority);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn tolerate_contradictions(mut self) -> Self {
        self.reject_contradictions = false;
        self
    }

    pub fn with_closed_world(mut self) -> Self {
        self.closed_world_assumption = true;
        self
    }

    pub fn with_exact_unbind_mode(mut self, mode: ExactUnbindMode) -> Self {
        self.exact_unbind_mode = mode;
        self
    }

    /// The effective branch order: explicit choice, else profile preference.
    pub fn effective_priority(&self) -> ReasoningPriority {
        match self.reasoning_priority {
            Some(p) => p,
            None => match self.reasoning_profile {
                ReasoningProfile::TheoryDriven => ReasoningPriority::Symbolic,
                ReasoningProfile::Associative => ReasoningPriority::Holographic,
            },
        }
    }
}

/// Per-call overrides for `query` and `prove`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallOptions {
    pub max_results: Option<usize>,
    pub timeout_ms: Option<u64>,
}

impl CallOptions {
    pub fn max_results(n: usize) -> Self {
        Self { max_results: Some(n), timeout_ms: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let opts = SessionOptions::default();
        assert_eq!(opts.depth_limit, 16);
        assert_eq!(opts.seed, 0);
        assert!(opts.timeout_ms.is_none());
        assert!(opts.reject_contradictions);
        assert_eq!(opts.effective_priority(), ReasoningPriority::Symbolic);
    }

    #[test]
    fn test_associative_profile_prefers_holographic() {
        let mut opts = SessionOptions::default();
        opts.reasoning_profile = ReasoningProfile::Associative;
        assert_eq!(opts.effective_priority(), ReasoningPriority::Holographic);
        let opts = opts.with_priority(ReasoningPriority::Symbolic);
        assert_eq!(opts.effective_priority(), ReasoningPriority::Symbolic);
    }
}
