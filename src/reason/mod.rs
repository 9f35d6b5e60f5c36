//! # Reasoning Kernel
//!
//! Bounded symbolic search over the fact graph:
//!
//! 1. **Exact lookup** — the goal's slots pick the cheapest index.
//! 2. **Rule chaining** — heads are unified against the goal, bodies are
//!    solved depth-first with renamed-apart variables. A visited set keyed
//!    on the canonicalized triple breaks cycles; a depth budget prunes
//!    runaway chains.
//! 3. **Default firing** — after fact and rule failure on a positive goal,
//!    typed defaults fire when the subject's type is derivable, the subject
//!    is not excepted, and no explicit fact occupies the property.
//! 4. **Contradiction check** — a positive success whose opposite fact
//!    exists surfaces `Kind::Contradiction` to the transaction layer.
//!
//! Conjunctions are solved with an explicit frame stack (remaining body,
//! substitution, alternative cursor) so depth and deadline checks sit at
//! uniform points and cancellation unwinds cleanly.

pub mod unify;
pub mod holographic;
pub mod arbiter;

use std::time::Instant;

use hashbrown::HashSet;
use tracing::trace;

use crate::graph::{DefaultStore, FactGraph, RuleStore};
use crate::model::{
    Atom, Fact, FactKey, Goal, Interner, Polarity, ProofStep, ReasoningStats, Solution,
    Source, Term, TriplePattern,
};
use crate::{Error, Result};

use unify::{apply, rename_apart, resolve, unify, unify_patterns, Subst};

pub use arbiter::{answer_query, prove_goal, Arbitration, ReasoningPriority};
pub use holographic::{CandidateIndex, HoloContext};

/// Canonicalized triple for cycle detection (holes collapse to `None`).
type VisitedKey = (Option<Atom>, Option<Atom>, Option<Atom>, Polarity);

/// Per-atom alternative cap inside conjunction solving. Decoupled from the
/// caller's solution limit: a prove asking for one solution must still see
/// every alternative while backtracking.
const ALTERNATIVES_CAP: usize = 128;

fn visited_key(pattern: &TriplePattern) -> VisitedKey {
    (
        pattern.subject.atom(),
        pattern.relation.atom(),
        pattern.object.atom(),
        pattern.polarity,
    )
}

/// Per-call kernel configuration.
#[derive(Debug, Clone, Copy)]
pub struct KernelConfig {
    pub depth_limit: usize,
    pub deadline: Option<Instant>,
    pub closed_world: bool,
    /// The interned `isA` relation (drives default typing).
    pub isa: Atom,
}

/// The symbolic search engine. Borrows the session's stores for one call.
pub struct Kernel<'a> {
    graph: &'a FactGraph,
    rules: &'a RuleStore,
    defaults: &'a DefaultStore,
    interner: &'a Interner,
    config: KernelConfig,
    stats: ReasoningStats,
    rename_counter: u64,
    started: Instant,
}

impl<'a> Kernel<'a> {
    pub fn new(
        graph: &'a FactGraph,
        rules: &'a RuleStore,
        defaults: &'a DefaultStore,
        interner: &'a Interner,
        config: KernelConfig,
    ) -> Self {
        Self {
            graph,
            rules,
            defaults,
            interner,
            config,
            stats: ReasoningStats::default(),
            rename_counter: 0,
            started: Instant::now(),
        }
    }

    /// Counters accumulated during this kernel's lifetime.
    pub fn stats(&self) -> &ReasoningStats {
        &self.stats
    }

    pub fn graph(&self) -> &FactGraph {
        self.graph
    }

    pub fn interner(&self) -> &Interner {
        self.interner
    }

    fn check_deadline(&self) -> Result<()> {
        if let Some(deadline) = self.config.deadline {
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    elapsed_ms: self.started.elapsed().as_millis() as u64,
                });
            }
        }
        Ok(())
    }

    // ========================================================================
    // Public entry points
    // ========================================================================

    /// Direct primary-index probe — the lookup that always wins arbitration.
    pub fn exact_lookup(&self, goal: &Goal) -> Option<Fact> {
        if !goal.is_triple() || !goal.is_ground() {
            return None;
        }
        let key = FactKey::new(
            goal.subject().atom()?,
            goal.relation.atom()?,
            goal.object().atom()?,
            Polarity::Pos,
        );
        self.graph.fact(&key)
    }

    /// Enumerate solutions for a goal with holes, ranked and deduplicated.
    pub fn query(&mut self, goal: &Goal, max_results: usize) -> Result<Vec<Solution>> {
        self.query_with_depth(goal, max_results, self.config.depth_limit)
    }

    /// Index-only enumeration: no rules, no defaults. The arbiter uses this
    /// to honor "exact lookup always wins" without paying for chaining.
    pub fn exact_solutions(&mut self, goal: &Goal, max_results: usize) -> Result<Vec<Solution>> {
        self.query_with_depth(goal, max_results, 0)
    }

    /// Solve a body conjunction under an initial substitution, returning the
    /// successful substitutions. Macro application drives this directly.
    pub fn solve_with_bindings(
        &mut self,
        body: &[TriplePattern],
        subst: &Subst,
    ) -> Result<Vec<Subst>> {
        let mut visited = HashSet::new();
        let solutions =
            self.solve_body(body, subst, self.config.depth_limit, &mut visited, ALTERNATIVES_CAP)?;
        Ok(solutions.into_iter().map(|(s, _)| s).collect())
    }

    fn query_with_depth(
        &mut self,
        goal: &Goal,
        max_results: usize,
        depth: usize,
    ) -> Result<Vec<Solution>> {
        let pattern = self.triple_pattern(goal)?;
        let mut visited = HashSet::new();
        let cap = max_results.saturating_mul(4).max(16);
        let raw = self.solve_pattern(&pattern, &Subst::new(), depth, &mut visited, cap)?;

        let hole_names: Vec<String> = goal.holes().iter().map(|h| (*h).to_owned()).collect();
        let mut seen: HashSet<Vec<(String, Atom)>> = HashSet::new();
        let mut out = Vec::new();
        for (subst, steps) in raw {
            let Some(root) = steps.last() else { continue };
            self.check_contradiction(&root.conclusion)?;

            let mut bindings = hashbrown::HashMap::new();
            for hole in &hole_names {
                if let Term::Atom(atom) = resolve(&Term::Hole(hole.clone()), &subst) {
                    bindings.insert(hole.clone(), atom);
                }
            }
            let mut dedup: Vec<(String, Atom)> =
                bindings.iter().map(|(k, v)| (k.clone(), *v)).collect();
            dedup.sort();
            if !seen.insert(dedup) {
                continue;
            }
            out.push(Solution {
                bindings,
                method: root.method.clone(),
                similarity: root.similarity,
                steps,
            });
        }
        out.sort_by(|a, b| a.rank_key().cmp(&b.rank_key()));
        out.truncate(max_results);
        Ok(out)
    }

    /// Prove a ground goal; `None` when no derivation exists within bounds.
    pub fn prove(&mut self, goal: &Goal) -> Result<Option<Vec<ProofStep>>> {
        if !goal.is_ground() {
            return Err(Error::Parse {
                message: format!("prove requires a ground goal, got {}", goal.render(self.interner)),
                location: None,
            });
        }
        let pattern = self.triple_pattern(goal)?;
        let mut visited = HashSet::new();
        let solutions =
            self.solve_pattern(&pattern, &Subst::new(), self.config.depth_limit, &mut visited, 1)?;
        match solutions.into_iter().next() {
            Some((_, steps)) => {
                if let Some(root) = steps.last() {
                    self.check_contradiction(&root.conclusion)?;
                }
                Ok(Some(steps))
            }
            None => Ok(None),
        }
    }

    fn triple_pattern(&self, goal: &Goal) -> Result<TriplePattern> {
        if !goal.is_triple() {
            return Err(Error::Parse {
                message: format!(
                    "symbolic search handles triples; {} has arity {}",
                    goal.render(self.interner),
                    goal.args.len()
                ),
                location: None,
            });
        }
        Ok(TriplePattern {
            subject: goal.subject().clone(),
            relation: goal.relation.clone(),
            object: goal.object().clone(),
            polarity: Polarity::Pos,
        })
    }

    fn check_contradiction(&self, fact: &Fact) -> Result<()> {
        if self.graph.contains(&fact.key().flipped()) {
            return Err(Error::Contradiction {
                subject: self.interner.name(fact.subject).to_owned(),
                relation: self.interner.name(fact.relation).to_owned(),
                object: self.interner.name(fact.object).to_owned(),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Single-atom search
    // ========================================================================

    /// All ways to satisfy one pattern: facts, then rules, then defaults.
    fn solve_pattern(
        &mut self,
        pattern: &TriplePattern,
        subst: &Subst,
        depth: usize,
        visited: &mut HashSet<VisitedKey>,
        limit: usize,
    ) -> Result<Vec<(Subst, Vec<ProofStep>)>> {
        self.check_deadline()?;
        let resolved = apply(pattern, subst);
        let mut out: Vec<(Subst, Vec<ProofStep>)> = Vec::new();

        // 1. Fact matches via the cheapest index
        for key in self.fact_candidates(&resolved) {
            if out.len() >= limit {
                break;
            }
            let mut extended = subst.clone();
            let matched = unify(&resolved.subject, &Term::Atom(key.subject), &mut extended)
                && unify(&resolved.relation, &Term::Atom(key.relation), &mut extended)
                && unify(&resolved.object, &Term::Atom(key.object), &mut extended);
            if !matched {
                continue;
            }
            if let Some(fact) = self.graph.fact(&key) {
                out.push((extended, vec![ProofStep::exact(fact)]));
            }
        }

        // 2. Rule chaining, cycle-guarded and budget-gated
        if depth > 0 {
            let vkey = visited_key(&resolved);
            if !visited.contains(&vkey) {
                visited.insert(vkey);
                let result = self.chain_rules(&resolved, subst, depth, visited, limit, &mut out);
                visited.remove(&vkey);
                result?;
            }
        }

        // 3. Defaults: positive goals only, after fact and rule failure
        if out.is_empty() && resolved.polarity == Polarity::Pos && depth > 0 {
            self.fire_defaults(&resolved, subst, depth, visited, limit, &mut out)?;
        }

        // 4. Closed-world negation for ground negative goals
        if out.is_empty()
            && resolved.polarity == Polarity::Neg
            && self.config.closed_world
            && resolved.is_ground()
        {
            self.abduce_negation(&resolved, subst, depth, visited, &mut out)?;
        }

        Ok(out)
    }

    fn chain_rules(
        &mut self,
        resolved: &TriplePattern,
        subst: &Subst,
        depth: usize,
        visited: &mut HashSet<VisitedKey>,
        limit: usize,
        out: &mut Vec<(Subst, Vec<ProofStep>)>,
    ) -> Result<()> {
        let rules: Vec<crate::model::Rule> =
            self.rules.ordered(resolved.relation.atom()).into_iter().cloned().collect();
        for rule in rules {
            if out.len() >= limit {
                break;
            }
            self.check_deadline()?;
            self.rename_counter += 1;
            let suffix = self.rename_counter;
            let head = rename_apart(&rule.head, suffix);
            let mut extended = subst.clone();
            if !unify_patterns(resolved, &head, &mut extended) {
                continue;
            }
            let body: Vec<TriplePattern> =
                rule.body.iter().map(|p| rename_apart(p, suffix)).collect();
            let body_solutions = self.solve_body(&body, &extended, depth - 1, visited, limit)?;
            for (solution, mut steps) in body_solutions {
                let conclusion = apply(&head, &solution);
                let (Some(s), Some(r), Some(o)) = (
                    conclusion.subject.atom(),
                    conclusion.relation.atom(),
                    conclusion.object.atom(),
                ) else {
                    continue;
                };
                let fact = Fact {
                    subject: s,
                    relation: r,
                    object: o,
                    polarity: conclusion.polarity,
                    source: Source::Derived,
                };
                let premises = self.instantiate_premises(&body, &solution);
                self.stats.rule_firings += 1;
                trace!(rule = %rule.name, conclusion = %fact_display(self.interner, &fact), "rule fired");
                steps.push(ProofStep::rule(fact, &rule.name, premises));
                out.push((solution, steps));
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Conjunction solver: explicit frames (atom index, alternatives,
    /// cursor) with chronological backtracking.
    fn solve_body(
        &mut self,
        atoms: &[TriplePattern],
        subst: &Subst,
        depth: usize,
        visited: &mut HashSet<VisitedKey>,
        limit: usize,
    ) -> Result<Vec<(Subst, Vec<ProofStep>)>> {
        if atoms.is_empty() {
            return Ok(vec![(subst.clone(), Vec::new())]);
        }

        struct Frame {
            alternatives: Vec<(Subst, Vec<ProofStep>)>,
            cursor: usize,
        }

        let mut out = Vec::new();
        let mut chosen: Vec<(Subst, Vec<ProofStep>)> = Vec::new();
        let mut frames = vec![Frame {
            alternatives: self.solve_pattern(&atoms[0], subst, depth, visited, ALTERNATIVES_CAP)?,
            cursor: 0,
        }];

        while let Some(top) = frames.last_mut() {
            if top.cursor >= top.alternatives.len() {
                frames.pop();
                chosen.pop();
                continue;
            }
            let alternative = top.alternatives[top.cursor].clone();
            top.cursor += 1;

            if frames.len() == atoms.len() {
                // Every atom satisfied: assemble the solution
                let mut steps: Vec<ProofStep> = Vec::new();
                for (_, s) in &chosen {
                    steps.extend(s.iter().cloned());
                }
                steps.extend(alternative.1);
                out.push((alternative.0, steps));
                if out.len() >= limit {
                    break;
                }
            } else {
                let next = self.solve_pattern(
                    &atoms[frames.len()],
                    &alternative.0,
                    depth,
                    visited,
                    ALTERNATIVES_CAP,
                )?;
                chosen.push(alternative);
                frames.push(Frame { alternatives: next, cursor: 0 });
            }
        }
        Ok(out)
    }

    // ========================================================================
    // Defaults
    // ========================================================================

    fn fire_defaults(
        &mut self,
        resolved: &TriplePattern,
        subst: &Subst,
        depth: usize,
        visited: &mut HashSet<VisitedKey>,
        limit: usize,
        out: &mut Vec<(Subst, Vec<ProofStep>)>,
    ) -> Result<()> {
        let Some(subject) = resolved.subject.atom() else { return Ok(()) };
        let Some(property) = resolved.relation.atom() else { return Ok(()) };

        let defaults: Vec<crate::model::DefaultRule> =
            self.defaults.for_property(property).into_iter().cloned().collect();
        for default in defaults {
            if out.len() >= limit {
                break;
            }
            self.check_deadline()?;
            let mut extended = subst.clone();
            if !unify(&resolved.object, &Term::Atom(default.value), &mut extended) {
                continue;
            }
            if default.excepts(subject) {
                continue;
            }
            // Any explicit fact on (subject, property, *) suppresses the default
            if self.graph.has_property_fact(subject, property) {
                continue;
            }
            // subject isA type, derivable with a strictly smaller budget
            let typing = TriplePattern {
                subject: Term::Atom(subject),
                relation: Term::Atom(self.config.isa),
                object: Term::Atom(default.ty),
                polarity: Polarity::Pos,
            };
            let typings = self.solve_pattern(&typing, &Subst::new(), depth - 1, visited, 1)?;
            let Some((_, typing_steps)) = typings.into_iter().next() else {
                continue;
            };
            let typing_fact = typing_steps
                .last()
                .map(|step| step.conclusion.clone())
                .unwrap_or(Fact::new(subject, self.config.isa, default.ty));

            let fact = Fact {
                subject,
                relation: property,
                object: default.value,
                polarity: Polarity::Pos,
                source: Source::Default,
            };
            self.stats.default_firings += 1;
            trace!(default = %default.name, conclusion = %fact_display(self.interner, &fact), "default fired");
            let mut steps = typing_steps;
            steps.push(ProofStep::default(fact, &default.name, vec![typing_fact]));
            out.push((extended, steps));
        }
        Ok(())
    }

    /// Closed-world negation: a ground negative goal holds when its positive
    /// counterpart is underivable. Tagged `abduced` — it is an assumption,
    /// not a derivation.
    fn abduce_negation(
        &mut self,
        resolved: &TriplePattern,
        subst: &Subst,
        depth: usize,
        visited: &mut HashSet<VisitedKey>,
        out: &mut Vec<(Subst, Vec<ProofStep>)>,
    ) -> Result<()> {
        let positive = TriplePattern { polarity: Polarity::Pos, ..resolved.clone() };
        let proofs = self.solve_pattern(&positive, subst, depth.saturating_sub(1), visited, 1)?;
        if !proofs.is_empty() {
            return Ok(());
        }
        let (Some(s), Some(r), Some(o)) = (
            resolved.subject.atom(),
            resolved.relation.atom(),
            resolved.object.atom(),
        ) else {
            return Ok(());
        };
        let fact = Fact {
            subject: s,
            relation: r,
            object: o,
            polarity: Polarity::Neg,
            source: Source::Derived,
        };
        out.push((
            subst.clone(),
            vec![ProofStep {
                conclusion: fact,
                method: crate::model::Method::Abduced,
                premises: smallvec::SmallVec::new(),
                similarity: None,
            }],
        ));
        Ok(())
    }

    // ========================================================================
    // Index selection
    // ========================================================================

    /// Candidate fact keys for a pattern, cheapest index first.
    ///
    /// Index slices preserve insertion order; the full-scan fallback sorts
    /// so enumeration stays deterministic.
    fn fact_candidates(&self, resolved: &TriplePattern) -> Vec<FactKey> {
        let polarity = resolved.polarity;
        let subject = resolved.subject.atom();
        let relation = resolved.relation.atom();
        let object = resolved.object.atom();

        let keys: Vec<FactKey> = match (subject, relation, object) {
            (Some(s), Some(r), Some(o)) => {
                let key = FactKey::new(s, r, o, polarity);
                if self.graph.contains(&key) { vec![key] } else { Vec::new() }
            }
            (Some(s), _, _) => self.graph.by_subject(s).to_vec(),
            (None, Some(r), Some(o)) => self.graph.by_rel_obj(r, o).to_vec(),
            (None, Some(r), None) => self.graph.by_relation(r).to_vec(),
            (None, None, _) => {
                let mut all: Vec<FactKey> = self.graph.keys().copied().collect();
                all.sort_by_key(|k| (k.subject, k.relation, k.object, k.polarity == Polarity::Neg));
                all
            }
        };
        keys.into_iter().filter(|k| k.polarity == polarity).collect()
    }

    /// The instantiated body atoms, as the premises of a rule step.
    fn instantiate_premises(&self, body: &[TriplePattern], subst: &Subst) -> Vec<Fact> {
        body.iter()
            .filter_map(|pattern| {
                let p = apply(pattern, subst);
                let (s, r, o) = (p.subject.atom()?, p.relation.atom()?, p.object.atom()?);
                let key = FactKey::new(s, r, o, p.polarity);
                let source = self
                    .graph
                    .meta(&key)
                    .map(|m| m.source)
                    .unwrap_or(Source::Derived);
                Some(Fact { subject: s, relation: r, object: o, polarity: p.polarity, source })
            })
            .collect()
    }
}

fn fact_display(interner: &Interner, fact: &Fact) -> String {
    format!(
        "({} {} {})",
        interner.name(fact.subject),
        interner.name(fact.relation),
        interner.name(fact.object)
    )
}
