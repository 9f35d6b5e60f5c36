//! Dense-binary codec.
//!
//! Bit containers with XOR binding and Hamming similarity. Bundling is a
//! bitwise majority vote with a deterministic tiebreak pattern. The random
//! baseline of unrelated vectors sits at 0.5; members of a bundle within
//! capacity stay well above `HDC_MATCH`.

use serde::{Deserialize, Serialize};

use super::{
    check_compatible, token_seed, Codec, CodecProperties, Strategy, Thresholds, Vector,
    XorShift64,
};
use crate::{Error, Result};

// ============================================================================
// DenseVector
// ============================================================================

/// A dense binary vector: `bits` bits packed into u64 words.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseVector {
    words: Vec<u64>,
    bits: usize,
}

impl DenseVector {
    /// All-zero container.
    pub fn zero(bits: usize) -> Self {
        Self { words: vec![0u64; bits / 64], bits }
    }

    /// Deterministic pseudo-random container from a seed.
    pub fn random(seed: u64, bits: usize) -> Self {
        let mut stream = XorShift64::new(seed);
        let words = (0..bits / 64).map(|_| stream.next_u64()).collect();
        Self { words, bits }
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    /// XOR binding — the fundamental associative operation.
    pub fn xor(&self, other: &DenseVector) -> DenseVector {
        let words = self
            .words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| a ^ b)
            .collect();
        DenseVector { words, bits: self.bits }
    }

    /// Hamming distance (number of differing bits).
    pub fn hamming(&self, other: &DenseVector) -> u32 {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    /// Cosine-like similarity: `1.0 − hamming / bits`.
    pub fn similarity(&self, other: &DenseVector) -> f32 {
        1.0 - (self.hamming(other) as f32 / self.bits as f32)
    }

    pub fn popcount(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Bitwise majority across `xs`; ties follow the tiebreak pattern.
    pub fn majority(xs: &[&DenseVector], tiebreak: &DenseVector) -> DenseVector {
        let bits = tiebreak.bits;
        let mut out = DenseVector::zero(bits);
        let total = xs.len() as u32;
        for w in 0..out.words.len() {
            let mut word = 0u64;
            for bit in 0..64 {
                let mask = 1u64 << bit;
                let ones: u32 = xs.iter().map(|v| u32::from(v.words[w] & mask != 0)).sum();
                let set = match (2 * ones).cmp(&total) {
                    std::cmp::Ordering::Greater => true,
                    std::cmp::Ordering::Less => false,
                    std::cmp::Ordering::Equal => tiebreak.words[w] & mask != 0,
                };
                if set {
                    word |= mask;
                }
            }
            out.words[w] = word;
        }
        out
    }
}

impl std::fmt::Debug for DenseVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Dense(bits={}, pop={}, 0x{:016x}..)", self.bits, self.popcount(), self.words[0])
    }
}

// ============================================================================
// DenseBinaryCodec
// ============================================================================

pub struct DenseBinaryCodec {
    bits: usize,
    seed: u64,
    tiebreak: DenseVector,
}

impl DenseBinaryCodec {
    /// `geometry` is the bit length, rounded up to a multiple of 64.
    pub fn new(geometry: usize, seed: u64) -> Self {
        let bits = geometry.next_multiple_of(64).max(64);
        let tiebreak = DenseVector::random(
            token_seed(Strategy::DenseBinary, bits, "__tiebreak", seed),
            bits,
        );
        Self { bits, seed, tiebreak }
    }

    fn view<'a>(&self, v: &'a Vector) -> Result<&'a DenseVector> {
        check_compatible(self, v)?;
        match v {
            Vector::Dense(d) => Ok(d),
            _ => Err(Error::StrategyMismatch {
                expected: Strategy::DenseBinary,
                got: v.strategy(),
            }),
        }
    }
}

impl Codec for DenseBinaryCodec {
    fn strategy(&self) -> Strategy {
        Strategy::DenseBinary
    }

    fn geometry(&self) -> usize {
        self.bits
    }

    fn new_vector(&self, token: &str) -> Vector {
        let seed = token_seed(Strategy::DenseBinary, self.bits, token, self.seed);
        Vector::Dense(DenseVector::random(seed, self.bits))
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Dense(self.view(a)?.xor(self.view(b)?)))
    }

    /// XOR is its own inverse.
    fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector> {
        self.bind(c, b)
    }

    fn bundle(&self, xs: &[Vector]) -> Result<Vector> {
        if xs.is_empty() {
            return Ok(Vector::Dense(DenseVector::zero(self.bits)));
        }
        let views: Vec<&DenseVector> = xs.iter().map(|v| self.view(v)).collect::<Result<_>>()?;
        Ok(Vector::Dense(DenseVector::majority(&views, &self.tiebreak)))
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32> {
        Ok(self.view(a)?.similarity(self.view(b)?))
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            hdc_match: 0.55,
            similarity: 0.60,
            verification: 0.05,
            rule_match: 0.70,
            conclusion_match: 0.65,
            bundle_common_score: 0.58,
            analogy_min: 0.35,
            analogy_max: 0.95,
            margin: 0.02,
        }
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties {
            recommended_bundle_capacity: 12,
            max_bundle_capacity: 24,
            bytes_per_vector: self.bits / 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> DenseBinaryCodec {
        DenseBinaryCodec::new(8192, 0)
    }

    #[test]
    fn test_random_deterministic() {
        let a = DenseVector::random(42, 8192);
        let b = DenseVector::random(42, 8192);
        assert_eq!(a, b);
        assert!(!a.is_zero());
    }

    #[test]
    fn test_xor_self_is_zero() {
        let a = DenseVector::random(123, 8192);
        assert!(a.xor(&a).is_zero());
    }

    #[test]
    fn test_random_pair_near_half_similarity() {
        let a = DenseVector::random(1, 8192);
        let b = DenseVector::random(2, 8192);
        assert!((a.similarity(&a) - 1.0).abs() < f32::EPSILON);
        let sim = a.similarity(&b);
        assert!(sim > 0.45 && sim < 0.55, "sim={sim}");
    }

    #[test]
    fn test_bind_unbind_roundtrip_is_exact() {
        let c = codec();
        let a = c.new_vector("a");
        let k = c.new_vector("k");
        let bound = c.bind(&a, &k).unwrap();
        let recovered = c.unbind(&bound, &k).unwrap();
        assert!((c.similarity(&recovered, &a).unwrap() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bundle_members_above_match_threshold() {
        let c = codec();
        let members: Vec<Vector> = (0..9).map(|i| c.new_vector(&format!("m{i}"))).collect();
        let bundle = c.bundle(&members).unwrap();
        let threshold = c.thresholds().hdc_match;
        for m in &members {
            let sim = c.similarity(&bundle, m).unwrap();
            assert!(sim >= threshold, "member sim {sim} below {threshold}");
        }
        let outsider = c.new_vector("outsider");
        let sim = c.similarity(&bundle, &outsider).unwrap();
        assert!(sim < threshold, "outsider sim {sim} above {threshold}");
    }

    #[test]
    fn test_geometry_mismatch_rejected() {
        let big = codec();
        let small = DenseBinaryCodec::new(4096, 0);
        let a = big.new_vector("a");
        let b = small.new_vector("b");
        let err = big.bind(&a, &b).unwrap_err();
        assert_eq!(err.kind(), crate::Kind::GeometryMismatch);
    }

    #[test]
    fn test_strategy_mismatch_rejected() {
        let c = codec();
        let a = c.new_vector("a");
        let other = super::super::sparse::SparsePolynomialCodec::new(256, 0).new_vector("b");
        let err = c.bind(&a, &other).unwrap_err();
        assert_eq!(err.kind(), crate::Kind::StrategyMismatch);
    }
}
