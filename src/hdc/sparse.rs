//! Sparse-polynomial codec.
//!
//! A vector is `k` exponent channels over the fixed modulus `MODULUS`
//! (one monomial exponent per channel). Binding adds exponents channel-wise
//! (polynomial product), unbinding subtracts them, and similarity counts
//! matching channels. The random baseline is `k / MODULUS` per channel —
//! effectively zero — so thresholds sit far below the dense codec's.

use serde::{Deserialize, Serialize};

use super::{
    check_compatible, token_seed, Codec, CodecProperties, Strategy, Thresholds, Vector,
    XorShift64,
};
use crate::{Error, Result};

/// Exponent space size shared by every sparse vector.
pub const MODULUS: u16 = 4_096;

// ============================================================================
// SparseVector
// ============================================================================

/// `k` exponent channels, each an offset in `Z_MODULUS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SparseVector {
    offsets: Vec<u16>,
}

impl SparseVector {
    pub fn random(seed: u64, k: usize) -> Self {
        let mut stream = XorShift64::new(seed);
        let offsets = (0..k)
            .map(|_| (stream.next_u64() % u64::from(MODULUS)) as u16)
            .collect();
        Self { offsets }
    }

    pub fn channels(&self) -> usize {
        self.offsets.len()
    }

    /// Channel-wise exponent addition (polynomial product).
    pub fn add(&self, other: &SparseVector) -> SparseVector {
        let offsets = self
            .offsets
            .iter()
            .zip(&other.offsets)
            .map(|(a, b)| (a + b) % MODULUS)
            .collect();
        SparseVector { offsets }
    }

    /// Channel-wise exponent subtraction (polynomial quotient).
    pub fn sub(&self, other: &SparseVector) -> SparseVector {
        let offsets = self
            .offsets
            .iter()
            .zip(&other.offsets)
            .map(|(a, b)| (a + MODULUS - b) % MODULUS)
            .collect();
        SparseVector { offsets }
    }

    /// Fraction of channels whose exponents agree.
    pub fn agreement(&self, other: &SparseVector) -> f32 {
        let matches = self
            .offsets
            .iter()
            .zip(&other.offsets)
            .filter(|(a, b)| a == b)
            .count();
        matches as f32 / self.offsets.len() as f32
    }

    /// Commutative superposition: inputs are canonically sorted, then channel
    /// `j` keeps the offset of input `j mod m`. Every member survives on an
    /// even share of channels regardless of argument order.
    pub fn interleave(xs: &[&SparseVector]) -> SparseVector {
        let mut sorted: Vec<&SparseVector> = xs.to_vec();
        sorted.sort();
        let k = sorted[0].offsets.len();
        let m = sorted.len();
        let offsets = (0..k).map(|j| sorted[j % m].offsets[j]).collect();
        SparseVector { offsets }
    }
}

// ============================================================================
// SparsePolynomialCodec
// ============================================================================

pub struct SparsePolynomialCodec {
    k: usize,
    seed: u64,
}

impl SparsePolynomialCodec {
    /// `geometry` is the exponent-channel count `k`.
    pub fn new(geometry: usize, seed: u64) -> Self {
        Self { k: geometry.max(16), seed }
    }

    fn view<'a>(&self, v: &'a Vector) -> Result<&'a SparseVector> {
        check_compatible(self, v)?;
        match v {
            Vector::Sparse(s) => Ok(s),
            _ => Err(Error::StrategyMismatch {
                expected: Strategy::SparsePolynomial,
                got: v.strategy(),
            }),
        }
    }
}

impl Codec for SparsePolynomialCodec {
    fn strategy(&self) -> Strategy {
        Strategy::SparsePolynomial
    }

    fn geometry(&self) -> usize {
        self.k
    }

    fn new_vector(&self, token: &str) -> Vector {
        let seed = token_seed(Strategy::SparsePolynomial, self.k, token, self.seed);
        Vector::Sparse(SparseVector::random(seed, self.k))
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Sparse(self.view(a)?.add(self.view(b)?)))
    }

    fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Sparse(self.view(c)?.sub(self.view(b)?)))
    }

    fn bundle(&self, xs: &[Vector]) -> Result<Vector> {
        if xs.is_empty() {
            return Ok(Vector::Sparse(SparseVector { offsets: vec![0; self.k] }));
        }
        let views: Vec<&SparseVector> = xs.iter().map(|v| self.view(v)).collect::<Result<_>>()?;
        Ok(Vector::Sparse(SparseVector::interleave(&views)))
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32> {
        Ok(self.view(a)?.agreement(self.view(b)?))
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            hdc_match: 0.05,
            similarity: 0.08,
            verification: 0.02,
            rule_match: 0.30,
            conclusion_match: 0.20,
            bundle_common_score: 0.10,
            analogy_min: 0.02,
            analogy_max: 0.95,
            margin: 0.02,
        }
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties {
            recommended_bundle_capacity: 10,
            max_bundle_capacity: 16,
            bytes_per_vector: self.k * 2,
        }
    }
}
