//! Exact symbolic codec — the lossless oracle.
//!
//! A vector is a multiset of monomials; a monomial is a multiset of
//! identifier tokens. Binding is the polynomial product (monomial-wise
//! union), bundling is the polynomial sum (multiset union), similarity is
//! multiset Jaccard. Nothing is approximated, which makes this codec the
//! reference oracle for the statistical codecs' tests.
//!
//! Two UNBIND modes exist:
//!
//! - **A (multiset subtraction)** — divide every dividend monomial by every
//!   key monomial, dropping non-divisible terms. Production default.
//! - **B (index cancellation)** — pair dividend and key monomials by sorted
//!   index and subtract what overlaps, keeping remainders. Produces a
//!   different ordering on ambiguous multisets; used for saturation
//!   diagnostics.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::{check_compatible, Codec, CodecProperties, Strategy, Thresholds, Vector};
use crate::{Error, Result};

/// A monomial: identifier token → multiplicity.
pub type Monomial = BTreeMap<String, u32>;

/// UNBIND mode for the exact codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnbindMode {
    /// Multiset subtraction (drops non-divisible terms).
    #[default]
    A,
    /// Index-based cancellation (keeps remainders).
    B,
}

// ============================================================================
// ExactVector
// ============================================================================

/// Polynomial over monomials: monomial → coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExactVector {
    terms: BTreeMap<Monomial, u32>,
}

impl ExactVector {
    pub fn atomic(token: &str) -> Self {
        let mut monomial = Monomial::new();
        monomial.insert(token.to_owned(), 1);
        let mut terms = BTreeMap::new();
        terms.insert(monomial, 1);
        Self { terms }
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Polynomial product: every pair of monomials merges factor counts.
    pub fn product(&self, other: &ExactVector) -> ExactVector {
        let mut terms: BTreeMap<Monomial, u32> = BTreeMap::new();
        for (ma, ca) in &self.terms {
            for (mb, cb) in &other.terms {
                let mut merged = ma.clone();
                for (token, count) in mb {
                    *merged.entry(token.clone()).or_insert(0) += count;
                }
                *terms.entry(merged).or_insert(0) += ca * cb;
            }
        }
        ExactVector { terms }
    }

    /// Polynomial sum: multiset union of terms.
    pub fn sum(&self, other: &ExactVector) -> ExactVector {
        let mut terms = self.terms.clone();
        for (m, c) in &other.terms {
            *terms.entry(m.clone()).or_insert(0) += c;
        }
        ExactVector { terms }
    }

    /// Multiset Jaccard over terms. Equal polynomials score 1.0.
    pub fn jaccard(&self, other: &ExactVector) -> f32 {
        let mut intersection = 0u64;
        let mut union = 0u64;
        for (m, ca) in &self.terms {
            let cb = other.terms.get(m).copied().unwrap_or(0);
            intersection += u64::from((*ca).min(cb));
            union += u64::from((*ca).max(cb));
        }
        for (m, cb) in &other.terms {
            if !self.terms.contains_key(m) {
                union += u64::from(*cb);
            }
        }
        if union == 0 {
            return 1.0;
        }
        intersection as f32 / union as f32
    }

    fn divides(divisor: &Monomial, dividend: &Monomial) -> bool {
        divisor
            .iter()
            .all(|(token, count)| dividend.get(token).copied().unwrap_or(0) >= *count)
    }

    fn quotient(dividend: &Monomial, divisor: &Monomial) -> Monomial {
        let mut out = dividend.clone();
        for (token, count) in divisor {
            if let Some(entry) = out.get_mut(token) {
                *entry = entry.saturating_sub(*count);
                if *entry == 0 {
                    out.remove(token);
                }
            }
        }
        out
    }

    /// Mode A: exact division, dropping non-divisible terms.
    fn unbind_subtraction(&self, key: &ExactVector, checks: &mut u64, emitted: &mut u64) -> ExactVector {
        let mut terms: BTreeMap<Monomial, u32> = BTreeMap::new();
        for (kb, cb) in &key.terms {
            for (m, cm) in &self.terms {
                *checks += 1;
                if Self::divides(kb, m) {
                    *terms.entry(Self::quotient(m, kb)).or_insert(0) += cm * cb;
                    *emitted += 1;
                }
            }
        }
        ExactVector { terms }
    }

    /// Mode B: sorted-index pairing with remainders.
    fn unbind_cancellation(&self, key: &ExactVector, checks: &mut u64, emitted: &mut u64) -> ExactVector {
        let key_terms: Vec<&Monomial> = key.terms.keys().collect();
        if key_terms.is_empty() {
            return self.clone();
        }
        let mut terms: BTreeMap<Monomial, u32> = BTreeMap::new();
        for (i, (m, cm)) in self.terms.iter().enumerate() {
            *checks += 1;
            let kb = key_terms[i % key_terms.len()];
            *terms.entry(Self::quotient(m, kb)).or_insert(0) += cm;
            *emitted += 1;
        }
        ExactVector { terms }
    }
}

// ============================================================================
// ExactCodec
// ============================================================================

pub struct ExactCodec {
    mode: UnbindMode,
    unbind_checks: AtomicU64,
    unbind_out_terms: AtomicU64,
}

impl ExactCodec {
    pub fn new(mode: UnbindMode) -> Self {
        Self {
            mode,
            unbind_checks: AtomicU64::new(0),
            unbind_out_terms: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> UnbindMode {
        self.mode
    }

    fn view<'a>(&self, v: &'a Vector) -> Result<&'a ExactVector> {
        check_compatible(self, v)?;
        match v {
            Vector::Exact(e) => Ok(e),
            _ => Err(Error::StrategyMismatch { expected: Strategy::Exact, got: v.strategy() }),
        }
    }
}

impl Codec for ExactCodec {
    fn strategy(&self) -> Strategy {
        Strategy::Exact
    }

    /// The symbolic codec has no numeric geometry.
    fn geometry(&self) -> usize {
        0
    }

    fn new_vector(&self, token: &str) -> Vector {
        Vector::Exact(ExactVector::atomic(token))
    }

    fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        Ok(Vector::Exact(self.view(a)?.product(self.view(b)?)))
    }

    fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector> {
        let (mut checks, mut emitted) = (0u64, 0u64);
        let out = match self.mode {
            UnbindMode::A => self.view(c)?.unbind_subtraction(self.view(b)?, &mut checks, &mut emitted),
            UnbindMode::B => self.view(c)?.unbind_cancellation(self.view(b)?, &mut checks, &mut emitted),
        };
        self.unbind_checks.fetch_add(checks, Ordering::Relaxed);
        self.unbind_out_terms.fetch_add(emitted, Ordering::Relaxed);
        Ok(Vector::Exact(out))
    }

    fn bundle(&self, xs: &[Vector]) -> Result<Vector> {
        let mut acc = ExactVector::default();
        for x in xs {
            acc = acc.sum(self.view(x)?);
        }
        Ok(Vector::Exact(acc))
    }

    fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32> {
        Ok(self.view(a)?.jaccard(self.view(b)?))
    }

    fn thresholds(&self) -> Thresholds {
        Thresholds {
            hdc_match: 0.01,
            similarity: 0.01,
            verification: 0.0,
            rule_match: 0.5,
            conclusion_match: 0.5,
            bundle_common_score: 0.01,
            analogy_min: 0.01,
            analogy_max: 1.0,
            margin: 0.0,
        }
    }

    fn properties(&self) -> CodecProperties {
        CodecProperties {
            recommended_bundle_capacity: 64,
            max_bundle_capacity: 4_096,
            bytes_per_vector: 0,
        }
    }

    fn drain_counters(&self) -> (u64, u64) {
        (
            self.unbind_checks.swap(0, Ordering::Relaxed),
            self.unbind_out_terms.swap(0, Ordering::Relaxed),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_unbind_is_lossless() {
        let c = ExactCodec::new(UnbindMode::A);
        let a = c.new_vector("a");
        let k = c.new_vector("k");
        let recovered = c.unbind(&c.bind(&a, &k).unwrap(), &k).unwrap();
        assert_eq!(recovered, a);
    }

    #[test]
    fn test_bundle_then_unbind_extracts_member() {
        let c = ExactCodec::new(UnbindMode::A);
        let key1 = c.new_vector("k1");
        let key2 = c.new_vector("k2");
        let v1 = c.new_vector("v1");
        let v2 = c.new_vector("v2");
        let bundle = c
            .bundle(&[c.bind(&key1, &v1).unwrap(), c.bind(&key2, &v2).unwrap()])
            .unwrap();
        let recovered = c.unbind(&bundle, &key1).unwrap();
        // The surviving term is exactly v1
        assert!((c.similarity(&recovered, &v1).unwrap() - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.similarity(&recovered, &v2).unwrap(), 0.0);
    }

    #[test]
    fn test_mode_b_keeps_remainders() {
        let c = ExactCodec::new(UnbindMode::B);
        let a = c.new_vector("a");
        let k = c.new_vector("k");
        let unrelated = c.unbind(&a, &k).unwrap();
        // Nothing cancels, but the term survives instead of being dropped
        match unrelated {
            Vector::Exact(e) => assert_eq!(e.term_count(), 1),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_telemetry_counters_drain() {
        let c = ExactCodec::new(UnbindMode::A);
        let a = c.new_vector("a");
        let k = c.new_vector("k");
        let bound = c.bind(&a, &k).unwrap();
        c.unbind(&bound, &k).unwrap();
        let (checks, emitted) = c.drain_counters();
        assert_eq!(checks, 1);
        assert_eq!(emitted, 1);
        assert_eq!(c.drain_counters(), (0, 0));
    }

    #[test]
    fn test_jaccard_of_disjoint_is_zero() {
        let c = ExactCodec::new(UnbindMode::A);
        let a = c.new_vector("a");
        let b = c.new_vector("b");
        assert_eq!(c.similarity(&a, &b).unwrap(), 0.0);
    }
}
