//! Priority arbiter — symbolic vs. holographic derivation order.
//!
//! Two policies:
//!
//! - **symbolic priority**: facts/rules/defaults first; the holographic
//!   branch only answers when the symbolic side comes up empty, and only
//!   above `HDC_MATCH + margin`.
//! - **holographic priority**: decode first and accept when top1 − top2
//!   clears the `VERIFICATION` gate; otherwise fall back to the symbolic
//!   branch. When both produce disagreeing answers the symbolic one wins
//!   and the holographic confidence rides along as telemetry.
//!
//! In both policies an exact fact hit wins over everything else.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    Fact, Goal, Method, Polarity, ProofStep, ReasoningStats, Solution, Source, Term,
};
use crate::Result;

use super::holographic::{Decode, HoloContext};
use super::Kernel;

/// Which branch runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReasoningPriority {
    #[default]
    Symbolic,
    Holographic,
}

/// Arbitrated answer set plus telemetry.
#[derive(Debug, Clone, Default)]
pub struct Arbitration {
    pub solutions: Vec<Solution>,
    /// Holographic top-1 similarity when the losing branch still produced
    /// a candidate (attached for telemetry, never an answer).
    pub holographic_confidence: Option<f32>,
}

// ============================================================================
// Query arbitration
// ============================================================================

pub fn answer_query(
    kernel: &mut Kernel<'_>,
    holo: &HoloContext<'_>,
    goal: &Goal,
    max_results: usize,
    priority: ReasoningPriority,
    stats: &mut ReasoningStats,
) -> Result<Arbitration> {
    // Exact fact lookup always wins, regardless of policy.
    if let Some(fact) = kernel.exact_lookup(goal) {
        debug!(goal = %goal.render(kernel.interner()), "exact hit short-circuits arbitration");
        return Ok(Arbitration {
            solutions: vec![Solution {
                bindings: hashbrown::HashMap::new(),
                method: Method::Exact,
                similarity: None,
                steps: vec![ProofStep::exact(fact)],
            }],
            holographic_confidence: None,
        });
    }

    let symbolic_applicable = goal.is_triple();
    let thresholds = holo.ops.codec().thresholds();

    match priority {
        ReasoningPriority::Symbolic => {
            if symbolic_applicable {
                let solutions = kernel.query(goal, max_results)?;
                if !solutions.is_empty() {
                    return Ok(Arbitration { solutions, holographic_confidence: None });
                }
            }
            if let Some(decode) = holo.decode(goal, stats)? {
                if decode.top1 >= thresholds.hdc_match + thresholds.margin {
                    return Ok(Arbitration {
                        solutions: vec![holographic_solution(goal, &decode)],
                        holographic_confidence: None,
                    });
                }
            }
            Ok(Arbitration::default())
        }

        ReasoningPriority::Holographic => {
            let decode = holo.decode(goal, stats)?;
            if let Some(d) = &decode {
                let verified = match d.top2 {
                    Some(top2) => d.top1 - top2 >= thresholds.verification,
                    None => true,
                };
                if verified {
                    // An exact index hit still outranks the decoded answer.
                    if symbolic_applicable {
                        let exact = kernel.exact_solutions(goal, max_results)?;
                        if !exact.is_empty() {
                            return Ok(Arbitration {
                                solutions: exact,
                                holographic_confidence: Some(d.top1),
                            });
                        }
                    }
                    return Ok(Arbitration {
                        solutions: vec![holographic_solution(goal, d)],
                        holographic_confidence: None,
                    });
                }
            }

            let solutions = if symbolic_applicable {
                kernel.query(goal, max_results)?
            } else {
                Vec::new()
            };
            if !solutions.is_empty() {
                // Symbolic wins; a disagreeing decode becomes telemetry.
                let confidence = decode.as_ref().and_then(|d| {
                    let agrees = solutions
                        .first()
                        .and_then(|s| s.bindings.get(&d.hole))
                        .map(|a| *a == d.answer)
                        .unwrap_or(false);
                    if agrees { None } else { Some(d.top1) }
                });
                return Ok(Arbitration { solutions, holographic_confidence: confidence });
            }
            if let Some(d) = decode {
                if d.top1 >= thresholds.hdc_match + thresholds.margin {
                    return Ok(Arbitration {
                        solutions: vec![holographic_solution(goal, &d)],
                        holographic_confidence: None,
                    });
                }
            }
            Ok(Arbitration::default())
        }
    }
}

// ============================================================================
// Prove arbitration
// ============================================================================

/// Arbitrated proof of a ground goal.
pub fn prove_goal(
    kernel: &mut Kernel<'_>,
    holo: &HoloContext<'_>,
    goal: &Goal,
    priority: ReasoningPriority,
    stats: &mut ReasoningStats,
) -> Result<(Option<Vec<ProofStep>>, Option<f32>)> {
    if let Some(fact) = kernel.exact_lookup(goal) {
        return Ok((Some(vec![ProofStep::exact(fact)]), None));
    }

    let thresholds = holo.ops.codec().thresholds();
    let symbolic_applicable = goal.is_triple();

    match priority {
        ReasoningPriority::Symbolic => {
            if symbolic_applicable {
                if let Some(steps) = kernel.prove(goal)? {
                    return Ok((Some(steps), None));
                }
            }
            match holo.verify_ground(goal, stats)? {
                Some(sim) if sim >= thresholds.hdc_match + thresholds.margin => {
                    Ok((holographic_proof(goal, sim), None))
                }
                _ => Ok((None, None)),
            }
        }
        ReasoningPriority::Holographic => {
            let verified = holo.verify_ground(goal, stats)?;
            if let Some(sim) = verified {
                if sim >= thresholds.hdc_match + thresholds.verification {
                    return Ok((holographic_proof(goal, sim), None));
                }
            }
            if symbolic_applicable {
                if let Some(steps) = kernel.prove(goal)? {
                    return Ok((Some(steps), verified));
                }
            }
            match verified {
                Some(sim) if sim >= thresholds.hdc_match + thresholds.margin => {
                    Ok((holographic_proof(goal, sim), None))
                }
                _ => Ok((None, None)),
            }
        }
    }
}

// ============================================================================
// Solution builders
// ============================================================================

fn holographic_solution(goal: &Goal, decode: &Decode) -> Solution {
    let mut bindings = hashbrown::HashMap::new();
    bindings.insert(decode.hole.clone(), decode.answer);

    // Triple goals get a concrete conclusion fact in the proof
    let steps = if goal.is_triple() {
        let fill = |term: &Term| match term {
            Term::Atom(a) => Some(*a),
            Term::Hole(name) if *name == decode.hole => Some(decode.answer),
            Term::Hole(_) => None,
        };
        match (fill(goal.subject()), goal.relation.atom(), fill(goal.object())) {
            (Some(s), Some(r), Some(o)) => {
                let fact = Fact {
                    subject: s,
                    relation: r,
                    object: o,
                    polarity: Polarity::Pos,
                    source: Source::Derived,
                };
                vec![ProofStep::holographic(fact, decode.top1)]
            }
            _ => Vec::new(),
        }
    } else {
        Vec::new()
    };

    Solution {
        bindings,
        method: Method::Holographic,
        similarity: Some(decode.top1),
        steps,
    }
}

fn holographic_proof(goal: &Goal, similarity: f32) -> Option<Vec<ProofStep>> {
    if !goal.is_triple() {
        return Some(Vec::new());
    }
    let (s, r, o) = (
        goal.subject().atom()?,
        goal.relation.atom()?,
        goal.object().atom()?,
    );
    let fact = Fact {
        subject: s,
        relation: r,
        object: o,
        polarity: Polarity::Pos,
        source: Source::Derived,
    };
    Some(vec![ProofStep::holographic(fact, similarity)])
}
