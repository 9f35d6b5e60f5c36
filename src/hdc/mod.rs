//! # HDC Codec Layer
//!
//! This is THE contract between the reasoning kernel and any vector-symbolic
//! strategy. Every operation the holographic branch needs is defined here.
//!
//! ## Implementations
//!
//! | Strategy | Module | Description |
//! |----------|--------|-------------|
//! | `DenseBinary` | `dense` | XOR bind, bitwise-majority bundle, Hamming similarity |
//! | `SparsePolynomial` | `sparse` | Exponent channels over a fixed modulus |
//! | `MetricAffine` | `metric` | Byte-channel translation, circular distance |
//! | `MetricAffineElastic` | `metric` | Metric-affine with a declared capacity curve |
//! | `Exact` | `exact` | Lossless symbolic multisets (test oracle) |
//!
//! Vectors are values tagged by the strategy that produced them; mixing
//! strategies or geometries in one operation is a hard error
//! (`StrategyMismatch` / `GeometryMismatch`), never a silent coercion.

pub mod dense;
pub mod sparse;
pub mod metric;
pub mod exact;
pub mod ops;
pub mod vocab;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub use dense::DenseVector;
pub use sparse::SparseVector;
pub use metric::MetricVector;
pub use exact::{ExactVector, UnbindMode};
pub use ops::{VectorOps, SimilarityHit};
pub use vocab::Vocabulary;

// ============================================================================
// Strategy
// ============================================================================

/// The five codec strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    DenseBinary,
    SparsePolynomial,
    MetricAffine,
    MetricAffineElastic,
    Exact,
}

impl Strategy {
    /// Default geometry when the session options leave it at 0.
    pub fn default_geometry(self) -> usize {
        match self {
            Strategy::DenseBinary => 8_192,
            Strategy::SparsePolynomial => 256,
            Strategy::MetricAffine | Strategy::MetricAffineElastic => 1_024,
            Strategy::Exact => 0,
        }
    }

    pub fn parse(name: &str) -> Option<Strategy> {
        match name {
            "dense-binary" => Some(Strategy::DenseBinary),
            "sparse-polynomial" => Some(Strategy::SparsePolynomial),
            "metric-affine" => Some(Strategy::MetricAffine),
            "metric-affine-elastic" => Some(Strategy::MetricAffineElastic),
            "exact" => Some(Strategy::Exact),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Strategy::DenseBinary => "dense-binary",
            Strategy::SparsePolynomial => "sparse-polynomial",
            Strategy::MetricAffine => "metric-affine",
            Strategy::MetricAffineElastic => "metric-affine-elastic",
            Strategy::Exact => "exact",
        };
        write!(f, "{name}")
    }
}

// ============================================================================
// Vector — the opaque value crossing the codec boundary
// ============================================================================

/// An opaque vector tagged by its producing strategy.
///
/// Two vectors are only compatible under operations of the same strategy
/// and geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Vector {
    Dense(DenseVector),
    Sparse(SparseVector),
    Metric(MetricVector),
    Exact(ExactVector),
}

impl Vector {
    pub fn strategy(&self) -> Strategy {
        match self {
            Vector::Dense(_) => Strategy::DenseBinary,
            Vector::Sparse(_) => Strategy::SparsePolynomial,
            Vector::Metric(m) => {
                if m.elastic {
                    Strategy::MetricAffineElastic
                } else {
                    Strategy::MetricAffine
                }
            }
            Vector::Exact(_) => Strategy::Exact,
        }
    }

    /// Strategy-specific geometry: bit length, exponent count, channel
    /// count, or 0 for the symbolic codec.
    pub fn geometry(&self) -> usize {
        match self {
            Vector::Dense(v) => v.bits(),
            Vector::Sparse(v) => v.channels(),
            Vector::Metric(v) => v.channels(),
            Vector::Exact(_) => 0,
        }
    }
}

// ============================================================================
// Thresholds & properties
// ============================================================================

/// Per-codec decision thresholds.
///
/// Metric codecs carry a smaller margin gate because their random baseline
/// sits higher; dense/sparse use the wider 0.02 gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub hdc_match: f32,
    pub similarity: f32,
    pub verification: f32,
    pub rule_match: f32,
    pub conclusion_match: f32,
    pub bundle_common_score: f32,
    pub analogy_min: f32,
    pub analogy_max: f32,
    /// Strict top1−top2 margin required to accept a cleanup winner.
    pub margin: f32,
}

/// Declared codec capacities and storage cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecProperties {
    pub recommended_bundle_capacity: usize,
    pub max_bundle_capacity: usize,
    pub bytes_per_vector: usize,
}

// ============================================================================
// Codec trait
// ============================================================================

/// A concrete vector-symbolic strategy.
///
/// Implementations are immutable after construction; the only interior
/// state permitted is telemetry counters (exact codec).
pub trait Codec: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn geometry(&self) -> usize;

    /// Pseudo-random but deterministic from (strategy, geometry, token, seed).
    fn new_vector(&self, token: &str) -> Vector;

    /// The codec's binding operation — approximately invertible via `unbind`.
    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector>;

    /// Recover `â` such that `similarity(â, a)` is maximal when `c = bind(a, b)`.
    fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector>;

    /// Superposition — commutative, membership-preserving up to capacity.
    fn bundle(&self, xs: &[Vector]) -> Result<Vector>;

    /// Codec-specific similarity, monotone in agreement.
    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32>;

    fn thresholds(&self) -> Thresholds;

    fn properties(&self) -> CodecProperties;

    /// Usable bundle capacity after `inserted_count` prior insertions.
    ///
    /// Constant for every codec except metric-affine-elastic, which declares
    /// a pure curve of (geometry, inserted_count).
    fn bundle_capacity(&self, _inserted_count: usize) -> usize {
        self.properties().recommended_bundle_capacity
    }

    /// Drain telemetry counters `(unbind_checks, unbind_out_terms)`.
    /// Only the exact codec maintains them.
    fn drain_counters(&self) -> (u64, u64) {
        (0, 0)
    }
}

/// Construct the codec for a strategy. `geometry == 0` selects the
/// strategy default. The session seed perturbs every generated vector.
pub fn build_codec(
    strategy: Strategy,
    geometry: usize,
    seed: u64,
    exact_unbind: UnbindMode,
) -> Arc<dyn Codec> {
    let geometry = if geometry == 0 { strategy.default_geometry() } else { geometry };
    match strategy {
        Strategy::DenseBinary => Arc::new(dense::DenseBinaryCodec::new(geometry, seed)),
        Strategy::SparsePolynomial => Arc::new(sparse::SparsePolynomialCodec::new(geometry, seed)),
        Strategy::MetricAffine => Arc::new(metric::MetricAffineCodec::new(geometry, seed, false)),
        Strategy::MetricAffineElastic => {
            Arc::new(metric::MetricAffineCodec::new(geometry, seed, true))
        }
        Strategy::Exact => Arc::new(exact::ExactCodec::new(exact_unbind)),
    }
}

// ============================================================================
// Deterministic generation primitives
// ============================================================================

/// String → u64 seed, used to bootstrap deterministic vector generation.
pub(crate) fn token_seed(strategy: Strategy, geometry: usize, token: &str, seed: u64) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    (strategy as u8).hash(&mut hasher);
    geometry.hash(&mut hasher);
    token.hash(&mut hasher);
    seed.hash(&mut hasher);
    hasher.finish()
}

/// SplitMix64-seeded xorshift64 stream (matches the deterministic container
/// generator used across the pack).
pub(crate) struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub(crate) fn new(seed: u64) -> Self {
        let mut z = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        Self { state: (z ^ (z >> 31)) | 1 }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }
}

// ============================================================================
// Cross-codec guards
// ============================================================================

pub(crate) fn check_compatible(codec: &dyn Codec, v: &Vector) -> Result<()> {
    if v.strategy() != codec.strategy() {
        return Err(Error::StrategyMismatch { expected: codec.strategy(), got: v.strategy() });
    }
    if codec.strategy() != Strategy::Exact && v.geometry() != codec.geometry() {
        return Err(Error::GeometryMismatch { expected: codec.geometry(), got: v.geometry() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_roundtrip_names() {
        for s in [
            Strategy::DenseBinary,
            Strategy::SparsePolynomial,
            Strategy::MetricAffine,
            Strategy::MetricAffineElastic,
            Strategy::Exact,
        ] {
            assert_eq!(Strategy::parse(&s.to_string()), Some(s));
        }
        assert_eq!(Strategy::parse("fourier"), None);
    }

    #[test]
    fn test_xorshift_deterministic() {
        let mut a = XorShift64::new(42);
        let mut b = XorShift64::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_token_seed_separates_strategies() {
        let a = token_seed(Strategy::DenseBinary, 8192, "dog", 0);
        let b = token_seed(Strategy::SparsePolynomial, 8192, "dog", 0);
        let c = token_seed(Strategy::DenseBinary, 8192, "dog", 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }
}
