//! Strategy-agnostic vector operations.
//!
//! Thin dispatch over the active codec, plus the two composite operations
//! the kernel uses everywhere: positioned bundling for ordered sequences
//! and top-K similarity ranking (cleanup).

use std::cell::Cell;
use std::sync::Arc;

use crate::model::Atom;
use crate::Result;

use super::{Codec, Vector, Vocabulary};

/// One ranked cleanup candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityHit {
    pub atom: Atom,
    pub score: f32,
}

/// Dispatching façade over the active codec.
///
/// Owned by a single session; counts similarity evaluations for the
/// statistics surface.
pub struct VectorOps {
    codec: Arc<dyn Codec>,
    similarity_checks: Cell<u64>,
}

impl VectorOps {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self { codec, similarity_checks: Cell::new(0) }
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub fn bind(&self, a: &Vector, b: &Vector) -> Result<Vector> {
        self.codec.bind(a, b)
    }

    pub fn unbind(&self, c: &Vector, b: &Vector) -> Result<Vector> {
        self.codec.unbind(c, b)
    }

    pub fn bundle(&self, xs: &[Vector]) -> Result<Vector> {
        self.codec.bundle(xs)
    }

    pub fn similarity(&self, a: &Vector, b: &Vector) -> Result<f32> {
        self.similarity_checks.set(self.similarity_checks.get() + 1);
        self.codec.similarity(a, b)
    }

    /// Ordered superposition: `bundle([bind(xs[i], Pos_i)])`.
    pub fn bundle_positioned(&self, xs: &[Vector], vocab: &Vocabulary) -> Result<Vector> {
        let mut positioned = Vec::with_capacity(xs.len());
        for (i, x) in xs.iter().enumerate() {
            positioned.push(self.bind(x, &vocab.position(i))?);
        }
        self.bundle(&positioned)
    }

    /// Rank `candidates` by similarity to `target`, best first.
    ///
    /// Ties break on atom order so that rankings are stable across runs.
    pub fn top_k_similar(
        &self,
        target: &Vector,
        candidates: &[(Atom, Vector)],
        k: usize,
    ) -> Result<Vec<SimilarityHit>> {
        let mut hits = Vec::with_capacity(candidates.len());
        for (atom, v) in candidates {
            hits.push(SimilarityHit { atom: *atom, score: self.similarity(target, v)? });
        }
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.atom.cmp(&b.atom))
        });
        hits.truncate(k);
        Ok(hits)
    }

    /// Drain the similarity-evaluation counter into session stats.
    pub fn take_similarity_checks(&self) -> u64 {
        self.similarity_checks.replace(0)
    }
}
