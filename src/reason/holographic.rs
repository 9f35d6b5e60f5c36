//! Holographic branch — answering goals by vector arithmetic + cleanup.
//!
//! An encoded tuple is a bind-chain over positioned slots: the operator at
//! `Pos_0`, arguments at `Pos_1..n`. Decoding unbinds the known slots from a
//! stored superposition (a scope vector or the session fact bundle), unbinds
//! the answer-slot position, and ranks a bounded candidate set by
//! similarity. A winner is accepted iff its similarity clears the codec's
//! `HDC_MATCH` threshold and strictly beats the runner-up.

use std::time::Instant;

use tracing::trace;

use crate::graph::FactGraph;
use crate::hdc::{Vector, VectorOps, Vocabulary};
use crate::model::{Atom, Goal, Interner, Polarity, ReasoningStats, Term};
use crate::scope::Scope;
use crate::{Error, Result};

/// Cleanup-candidate cap for ordinary pools.
const CANDIDATE_CAP: usize = 10;
/// Cap when the pool is large (> 100 atoms).
const CANDIDATE_CAP_WIDE: usize = 25;

// ============================================================================
// CandidateIndex
// ============================================================================

/// Atoms seen per (relation, argument slot) while encoding tuples.
///
/// This is the symbolic shadow of the holographic store: it never answers a
/// query by itself, it only narrows cleanup to plausible atoms.
#[derive(Debug, Default)]
pub struct CandidateIndex {
    by_slot: hashbrown::HashMap<(Atom, usize), Vec<Atom>>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, relation: Atom, slot: usize, atom: Atom) {
        let entry = self.by_slot.entry((relation, slot)).or_default();
        if !entry.contains(&atom) {
            entry.push(atom);
        }
    }

    pub fn candidates(&self, relation: Atom, slot: usize) -> &[Atom] {
        self.by_slot
            .get(&(relation, slot))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn clear(&mut self) {
        self.by_slot.clear();
    }
}

// ============================================================================
// Decode result
// ============================================================================

/// Accepted cleanup winner.
#[derive(Debug, Clone, PartialEq)]
pub struct Decode {
    pub answer: Atom,
    pub hole: String,
    pub top1: f32,
    /// Runner-up similarity, when the pool had more than one candidate.
    pub top2: Option<f32>,
}

// ============================================================================
// HoloContext
// ============================================================================

/// Borrowed view of everything the holographic branch needs for one call.
pub struct HoloContext<'a> {
    pub ops: &'a VectorOps,
    pub vocab: &'a Vocabulary,
    pub scope: &'a Scope,
    pub graph: &'a FactGraph,
    pub candidates: &'a CandidateIndex,
    pub interner: &'a Interner,
    pub isa: Atom,
    pub deadline: Option<Instant>,
}

impl<'a> HoloContext<'a> {
    fn check_deadline(&self, started: Instant) -> Result<()> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    fn atom_vector(&self, atom: Atom) -> Vector {
        self.vocab.get_or_create(self.interner.name(atom))
    }

    /// Bind-chain a full tuple: `bind(rel, Pos_0) ⊗ bind(arg_i, Pos_{i+1})`.
    pub fn encode_tuple(&self, relation: Atom, args: &[Atom]) -> Result<Vector> {
        let mut acc = self
            .ops
            .bind(&self.atom_vector(relation), &self.vocab.position(0))?;
        for (i, arg) in args.iter().enumerate() {
            let positioned = self.ops.bind(&self.atom_vector(*arg), &self.vocab.position(i + 1))?;
            acc = self.ops.bind(&acc, &positioned)?;
        }
        Ok(acc)
    }

    /// The partial vector over the goal's known slots, plus the answer
    /// hole's (slot index, name). `None` when the goal shape is not
    /// decodable (relation hole, zero or several arg holes).
    fn partial_vector(&self, goal: &Goal) -> Result<Option<(Vector, usize, String)>> {
        let Some(relation) = goal.relation.atom() else {
            return Ok(None);
        };
        let holes: Vec<(usize, &str)> = goal
            .args
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.hole_name().map(|n| (i, n)))
            .collect();
        let answer = match goal.answer_hole_name() {
            Some(name) => holes.iter().find(|(_, n)| *n == name).copied(),
            None => None,
        };
        let Some((hole_idx, hole_name)) = answer.or_else(|| holes.first().copied()) else {
            return Ok(None);
        };
        if holes.len() != 1 {
            return Ok(None);
        }

        let mut acc = self
            .ops
            .bind(&self.atom_vector(relation), &self.vocab.position(0))?;
        for (i, arg) in goal.args.iter().enumerate() {
            if let Term::Atom(atom) = arg {
                let positioned =
                    self.ops.bind(&self.atom_vector(*atom), &self.vocab.position(i + 1))?;
                acc = self.ops.bind(&acc, &positioned)?;
            }
        }
        Ok(Some((acc, hole_idx + 1, hole_name.to_owned())))
    }

    /// Superpositions worth decoding from: scope vectors in binding order,
    /// then the whole-graph fact bundle while it still fits in capacity.
    fn targets(&self) -> Result<Vec<Vector>> {
        let mut targets: Vec<Vector> = self.scope.iter().map(|(_, e)| e.vector.clone()).collect();
        let capacity = self.ops.codec().properties().max_bundle_capacity;
        if !self.graph.is_empty() && self.graph.len() <= capacity {
            let mut keys: Vec<_> = self
                .graph
                .keys()
                .filter(|k| k.polarity == Polarity::Pos)
                .copied()
                .collect();
            keys.sort_by_key(|k| (k.subject, k.relation, k.object));
            let mut encoded = Vec::with_capacity(keys.len());
            for key in keys {
                encoded.push(self.encode_tuple(key.relation, &[key.subject, key.object])?);
            }
            if !encoded.is_empty() {
                targets.push(self.ops.bundle(&encoded)?);
            }
        }
        Ok(targets)
    }

    /// Cleanup pool: candidate-index hints, then atoms from the relation's
    /// fact index at the hole slot, then instances of the pool's dominant
    /// `isA` type. Deduplicated in that order, capped.
    fn candidate_pool(&self, relation: Atom, hole_slot: usize) -> Vec<(Atom, Vector)> {
        let mut pool: Vec<Atom> = Vec::new();
        let mut push = |atom: Atom, pool: &mut Vec<Atom>| {
            if !pool.contains(&atom) {
                pool.push(atom);
            }
        };

        for &atom in self.candidates.candidates(relation, hole_slot) {
            push(atom, &mut pool);
        }
        for key in self.graph.by_relation(relation) {
            if key.polarity != Polarity::Pos {
                continue;
            }
            // slot 1 is the subject, slot 2 the object of a triple fact
            match hole_slot {
                1 => push(key.subject, &mut pool),
                2 => push(key.object, &mut pool),
                _ => {}
            }
        }

        // Atoms of the expected type: the modal isA type over the pool so far
        if let Some(ty) = self.dominant_type(&pool) {
            for key in self.graph.by_rel_obj(self.isa, ty) {
                if key.polarity == Polarity::Pos {
                    push(key.subject, &mut pool);
                }
            }
        }

        let cap = if pool.len() > 100 { CANDIDATE_CAP_WIDE } else { CANDIDATE_CAP };
        pool.truncate(cap);
        pool.into_iter().map(|a| (a, self.atom_vector(a))).collect()
    }

    /// Most common `isA` object among `atoms`; ties go to the first seen.
    fn dominant_type(&self, atoms: &[Atom]) -> Option<Atom> {
        let mut counts: Vec<(Atom, usize)> = Vec::new();
        for &atom in atoms {
            for key in self.graph.by_subject(atom) {
                if key.relation == self.isa && key.polarity == Polarity::Pos {
                    match counts.iter_mut().find(|(ty, _)| *ty == key.object) {
                        Some((_, n)) => *n += 1,
                        None => counts.push((key.object, 1)),
                    }
                }
            }
        }
        counts.into_iter().max_by_key(|(_, n)| *n).map(|(ty, _)| ty)
    }

    // ========================================================================
    // Decode / verify
    // ========================================================================

    /// Decode the answer hole of `goal` against every target superposition.
    ///
    /// Returns the best accepted winner, or `None` when no target yields a
    /// candidate above `HDC_MATCH` with a strict top-1 margin.
    pub fn decode(&self, goal: &Goal, stats: &mut ReasoningStats) -> Result<Option<Decode>> {
        let started = Instant::now();
        let Some((partial, hole_slot, hole_name)) = self.partial_vector(goal)? else {
            return Ok(None);
        };
        let Some(relation) = goal.relation.atom() else {
            return Ok(None);
        };
        let pool = self.candidate_pool(relation, hole_slot);
        if pool.is_empty() {
            return Ok(None);
        }
        let thresholds = self.ops.codec().thresholds();

        let mut best: Option<Decode> = None;
        for target in self.targets()? {
            self.check_deadline(started)?;
            let residual = self.ops.unbind(&target, &partial)?;
            let answer_vec = self.ops.unbind(&residual, &self.vocab.position(hole_slot))?;
            stats.holographic_decodes += 1;

            let hits = self.ops.top_k_similar(&answer_vec, &pool, 2)?;
            let Some(top1) = hits.first() else { continue };
            let top2 = hits.get(1).map(|h| h.score);
            trace!(
                goal = %goal.render(self.interner),
                winner = %self.interner.name(top1.atom),
                top1 = f64::from(top1.score),
                "holographic decode"
            );
            if top1.score < thresholds.hdc_match {
                continue;
            }
            if let Some(t2) = top2 {
                if top1.score <= t2 {
                    continue;
                }
            }
            let better = best.as_ref().map(|b| top1.score > b.top1).unwrap_or(true);
            if better {
                best = Some(Decode {
                    answer: top1.atom,
                    hole: hole_name.clone(),
                    top1: top1.score,
                    top2,
                });
            }
        }
        Ok(best)
    }

    /// Membership check for a ground goal: does any target superposition
    /// contain the encoded tuple above `HDC_MATCH`?
    pub fn verify_ground(&self, goal: &Goal, stats: &mut ReasoningStats) -> Result<Option<f32>> {
        let started = Instant::now();
        let Some(relation) = goal.relation.atom() else {
            return Ok(None);
        };
        let mut args = Vec::with_capacity(goal.args.len());
        for arg in &goal.args {
            match arg.atom() {
                Some(a) => args.push(a),
                None => return Ok(None),
            }
        }
        let tuple = self.encode_tuple(relation, &args)?;
        let threshold = self.ops.codec().thresholds().hdc_match;

        let mut best: Option<f32> = None;
        for target in self.targets()? {
            self.check_deadline(started)?;
            stats.holographic_decodes += 1;
            let sim = self.ops.similarity(&target, &tuple)?;
            if sim >= threshold && best.map(|b| sim > b).unwrap_or(true) {
                best = Some(sim);
            }
        }
        Ok(best)
    }
}
