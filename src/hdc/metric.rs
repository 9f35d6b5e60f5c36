//! Metric-affine codecs (plain and elastic).
//!
//! A vector is a row of byte channels. Binding translates every channel by
//! the key's offset (wrapping add), unbinding reverses the translation, and
//! similarity is one minus the mean circular distance over `Z_256`. The
//! random baseline is 0.5 but concentrates tightly at wide geometries, so
//! these codecs declare the narrow 0.005 margin gate.
//!
//! The elastic variant shares the algebra and differs only in its declared
//! capacity curve: a pure function of (geometry, inserted_count).

use serde::{Deserialize, Serialize};

use super::{
    check_compatible, token_seed, Codec, CodecProperties, Strategy, Thresholds, Vector,
    XorShift64,
};
use crate::{Error, Result};

// ============================================================================
// MetricVector
// ============================================================================

/// Byte-channel vector. `elastic` tags which metric strategy produced it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricVector {
    channels: Vec<u8>,
    pub(crate) elastic: bool,
}

impl MetricVector {
    pub fn random(seed: u64, channels: usize, elastic: bool) -> Self {
        let mut stream = XorShift64::new(seed);
        let mut bytes = Vec::with_capacity(channels);
        while bytes.len() < channels {
            let word = stream.next_u64();
            for shift in 0..8 {
                if bytes.len() == channels {
                    break;
                }
                bytes.push((word >> (shift * 8)) as u8);
            }
        }
        Self { channels: bytes, elastic }
    }

    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Channel-wise affine translation.
    pub fn translate(&self, key: &MetricVector) -> MetricVector {
        let channels = self
            .channels
            .iter()
            .zip(&key.channels)
            .map(|(a, b)| a.wrapping_add(*b))
            .collect();
        MetricVector { channels, elastic: self.elastic }
    }

    /// Inverse translation.
    pub fn untranslate(&self, key: &MetricVector) -> MetricVector {
        let channels = self
            .channels
            .iter()
            .zip(&key.channels)
            .map(|(a, b)| a.wrapping_sub(*b))
            .collect();
        MetricVector { channels, elastic: self.elastic }
    }

    /// 1 − mean circular distance / 128. Identical rows score 1.0; uniform
    /// random rows score ≈ 0.5.
    pub fn proximity(&self, other: &MetricVector) -> f32 {
        let total: u32 = self
            .channels
            .iter()
            .zip(&other.channels)
            .map(|(a, b)| {
                let d = u32::from(a.wrapping_sub(*b));
                d.min(256 - d)
            })
            .sum();
        1.0 - (total as f32 / self.channels.len() as f32) / 128.0
    }

    /// Commutative superposition by canonical interleave (see the sparse
    /// codec): channel `j` keeps input `j mod m`'s byte.
    pub fn interleave(xs: &[&MetricVector]) -> MetricVector {
        let mut sorted: Vec<&MetricVector> = xs.to_vec();
        sorted.sort();
        let n = sorted[0].channels.len();
        let m = sorted.len();
        let channels = (0..n).map(|j| sorted[j % m].channels[j]).collect();
        MetricVector { channels, elastic: sorted[0].elastic }
    }
}

// ============================================================================
// MetricAffineCodec (plain + elastic)
// ============================================================================

pub struct MetricAffineCodec {
    channels: usize,
    seed: u64,
    elastic: bool,
}

impl MetricAffineCodec {
    /// `geometry` is the byte channel count.
    pub fn new(geometry: usize, seed: u64, elastic: bool) -> Self {
        Self { channels: geometry.max(64), seed, elastic }
    }

    /// Declared elastic capacity curve: shrinks with prior insertions,
    /// clamped to [4, 32].
    pub fn elastic_capacity(geometry: usize, inserted_count: usize) -> usize {
        (geometry / 64).saturating_sub(inserted_count / 16).clamp(4, 32)
    }

    fn view<'a>(&self, v: &'a Vector) -> Result<&'a MetricVector> {
        check_compatible(self, v)?;
        match v {
            Vector::Metric(m) => Ok(m),
            _ => Err(Error::StrategyMismatch {
                expected: self.strategy(),
                got: v.strategy(),
            }),
        }
    }
}

impl Codec for MetricAffineCodec {
    fn strategy(&self) -> Strategy {
        if self.elastic {
            Strategy::MetricAffineElastic
        } else {
            Strategy::MetricAffine
        }
    }

    fn geometry(&self) -> usize {
        self.channels
    }

    fn new_vector(&self, token: &str) -> Vector {
        let seed = token_seed(self.strategy(), self.channels, token, self.seed);
        Vector::Metric(MetricVector::random(seed, self.channels, self.elastic))
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Metric(self.view(a)?.translate(self.view(b)?)))
    }

    fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Metric(self.view(c)?.untranslate(self.view(b)?)))
    }

    fn bundle(&self, xs: &[Vector]) -> Result<Vector> {
        if xs.is_empty() {
            return Ok(Vector::Metric(MetricVector {
                channels: vec![0; self.channels],
                elastic: self.elastic,
            }));
        }
        let views: Vec<&MetricVector> = xs.iter().map(|v| self.view(v)).collect::<Result<_>>()?;
        Ok(Vector::Metric(MetricVector::interleave(&views)))
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32> {
        Ok(self.view(a)?.proximity(self.view(b)?))
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            hdc_match: 0.52,
            similarity: 0.55,
            verification: 0.01,
            rule_match: 0.60,
            conclusion_match: 0.58,
            bundle_common_score: 0.53,
            analogy_min: 0.30,
            analogy_max: 0.90,
            margin: 0.005,
        }
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties {
            recommended_bundle_capacity: if self.elastic {
                Self::elastic_capacity(self.channels, 0)
            } else {
                10
            },
            max_bundle_capacity: if self.elastic { 32 } else { 16 },
            bytes_per_vector: self.channels,
        }
    }

    fn bundle_capacity(&self, inserted_count: usize) -> usize {
        if self.elastic {
            Self::elastic_capacity(self.channels, inserted_count)
        } else {
            self.properties().recommended_bundle_capacity
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> MetricAffineCodec {
        MetricAffineCodec::new(1024, 0, false)
    }

    #[test]
    fn test_bind_unbind_roundtrip_is_exact() {
        let c = codec();
        let a = c.new_vector("a");
        let k = c.new_vector("k");
        let recovered = c.unbind(&c.bind(&a, &k).unwrap(), &k).unwrap();
        assert!((c.similarity(&recovered, &a).unwrap() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_random_pair_near_half_proximity() {
        let c = codec();
        let a = c.new_vector("a");
        let b = c.new_vector("b");
        let sim = c.similarity(&a, &b).unwrap();
        assert!(sim > 0.45 && sim < 0.55, "sim={sim}");
    }

    #[test]
    fn test_bundle_membership_small_set() {
        let c = codec();
        let members: Vec<Vector> = (0..5).map(|i| c.new_vector(&format!("m{i}"))).collect();
        let bundle = c.bundle(&members).unwrap();
        let threshold = c.thresholds().hdc_match;
        for m in &members {
            let sim = c.similarity(&bundle, m).unwrap();
            assert!(sim >= threshold, "member sim {sim} below {threshold}");
        }
    }

    #[test]
    fn test_elastic_capacity_curve_is_pure_and_monotone() {
        let fresh = MetricAffineCodec::elastic_capacity(1024, 0);
        let worn = MetricAffineCodec::elastic_capacity(1024, 200);
        assert_eq!(fresh, MetricAffineCodec::elastic_capacity(1024, 0));
        assert!(worn <= fresh);
        assert!(worn >= 4);
    }

    #[test]
    fn test_elastic_and_plain_vectors_do_not_mix() {
        let plain = codec();
        let elastic = MetricAffineCodec::new(1024, 0, true);
        let a = plain.new_vector("a");
        let b = elastic.new_vector("b");
        let err = plain.bind(&a, &b).unwrap_err();
        assert_eq!(err.kind(), crate::Kind::StrategyMismatch);
    }
}
