//! # Session Façade
//!
//! The primary entry point. A `Session` owns the fact graph, rule and
//! default stores, scope, vocabulary and statistics, and exposes the public
//! contract: `learn`, `query`, `prove`, `describe_result`, `check_dsl`,
//! `load_pack`, `reset`, `close`.
//!
//! Every top-level mutator opens a transaction on entry, commits on normal
//! return and rolls back on error; nested statement execution (macro
//! expansion, `Load` directives) shares the outer transaction. A session is
//! single-threaded by contract — only the vocabulary registry carries
//! interior synchronization, so a multi-session host may share it.

pub mod options;
pub mod describe;
pub mod pack;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::dsl::{CheckMode, DslParser, Expr, SourceResolver, Statement};
use crate::graph::{Asserted, DefaultStore, FactGraph, RuleStore};
use crate::hdc::{build_codec, Vector, VectorOps, Vocabulary};
use crate::model::{
    Atom, Binding, DefaultRule, Fact, FactKey, GoalSpec, Interner, LearnOutcome,
    Polarity, ProveReport, QueryReport, ReasoningStats, Rule, Source, Term, TriplePattern,
};
use crate::reason::{
    answer_query, prove_goal, CandidateIndex, HoloContext, Kernel, KernelConfig,
};
use crate::scope::{Journal, Scope, Snapshot};
use crate::{Error, Kind, Result};

pub use describe::DescribeTarget;
pub use options::{
    CallOptions, ExactUnbindMode, ReasoningPriority, ReasoningProfile, SessionOptions,
};

/// Maximum `Load`/macro nesting inside one top-level call.
const LOAD_DEPTH_LIMIT: usize = 32;

// ============================================================================
// Session
// ============================================================================

pub struct Session {
    options: SessionOptions,
    interner: Interner,
    vocab: Vocabulary,
    ops: VectorOps,
    graph: FactGraph,
    rules: RuleStore,
    defaults: DefaultStore,
    scope: Scope,
    journal: Journal,
    candidates: CandidateIndex,
    stats: ReasoningStats,
    isa: Atom,
    parser: Option<Arc<dyn DslParser>>,
    resolver: Option<Arc<dyn SourceResolver>>,
    poisoned: bool,
    closed: bool,
}

impl Session {
    pub fn new(options: SessionOptions) -> Result<Self> {
        let codec = build_codec(
            options.hdc_strategy,
            options.geometry,
            options.seed,
            options.exact_unbind_mode,
        );
        let vocab = Vocabulary::new(codec.clone());
        let ops = VectorOps::new(codec);
        let mut interner = Interner::new();
        let isa = interner.intern("isA")?;
        debug!(strategy = %options.hdc_strategy, geometry = options.geometry, "session opened");
        Ok(Self {
            options,
            interner,
            vocab,
            ops,
            graph: FactGraph::new(),
            rules: RuleStore::new(),
            defaults: DefaultStore::new(),
            scope: Scope::new(),
            journal: Journal::new(),
            candidates: CandidateIndex::new(),
            stats: ReasoningStats::default(),
            isa,
            parser: None,
            resolver: None,
            poisoned: false,
            closed: false,
        })
    }

    /// Attach the external DSL parser (required by `check_dsl`).
    pub fn with_parser(mut self, parser: Arc<dyn DslParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Attach the external source resolver (required by `Load` statements).
    pub fn with_resolver(mut self, resolver: Arc<dyn SourceResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Cumulative reasoning counters (additive until `reset`).
    pub fn stats(&self) -> ReasoningStats {
        self.stats
    }

    /// Stats as a JSON object, for host-side telemetry sinks.
    pub fn stats_json(&self) -> String {
        serde_json::to_string(&self.stats).unwrap_or_else(|_| "{}".to_owned())
    }

    pub fn fact_count(&self) -> usize {
        self.graph.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn default_count(&self) -> usize {
        self.defaults.len()
    }

    pub fn scope_contains(&self, name: &str) -> bool {
        self.scope.get(name).is_some()
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    // ========================================================================
    // Guards
    // ========================================================================

    fn guard(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Internal("session is closed".into()));
        }
        if self.poisoned {
            return Err(Error::Internal(
                "session is poisoned; reset() before further use".into(),
            ));
        }
        Ok(())
    }

    fn absorb_error(&mut self, error: &Error) {
        if error.kind() == Kind::Internal {
            self.poisoned = true;
        }
        if error.kind() == Kind::Contradiction {
            self.stats.contradictions += 1;
        }
    }

    fn drain_codec_counters(&mut self) {
        self.stats.similarity_checks += self.ops.take_similarity_checks();
        let (checks, terms) = self.ops.codec().drain_counters();
        self.stats.exact_unbind_checks += checks;
        self.stats.exact_unbind_out_terms += terms;
    }

    fn deadline(&self, opts: Option<&CallOptions>) -> Option<Instant> {
        let ms = opts
            .and_then(|o| o.timeout_ms)
            .or(self.options.timeout_ms)?;
        Some(Instant::now() + Duration::from_millis(ms))
    }

    // ========================================================================
    // learn
    // ========================================================================

    /// Execute a parsed statement stream inside one transaction.
    ///
    /// Recoverable errors (unknown concepts, tolerated contradictions) are
    /// recorded in the outcome; everything else aborts and rolls back.
    pub fn learn(&mut self, program: &[Statement]) -> Result<LearnOutcome> {
        self.guard()?;
        debug!(statements = program.len(), "learn");
        let snapshot = self.journal.begin();
        let mut outcome = LearnOutcome::default();
        let deadline = self.deadline(None);

        match self.execute_program(program, 0, deadline, &mut outcome) {
            Ok(()) => {
                self.journal.commit(snapshot);
                self.drain_codec_counters();
                outcome.success = outcome.errors.is_empty();
                Ok(outcome)
            }
            Err(error) => {
                self.rollback(snapshot);
                self.drain_codec_counters();
                self.absorb_error(&error);
                Err(error)
            }
        }
    }

    fn rollback(&mut self, snapshot: Snapshot) {
        self.journal.rollback(
            snapshot,
            &mut self.graph,
            &mut self.scope,
            &mut self.rules,
            &mut self.defaults,
        );
        debug!("transaction rolled back");
    }

    fn execute_program(
        &mut self,
        program: &[Statement],
        load_depth: usize,
        deadline: Option<Instant>,
        outcome: &mut LearnOutcome,
    ) -> Result<()> {
        for statement in program {
            match self.execute_statement(statement, load_depth, deadline, outcome) {
                Ok(()) => {}
                Err(error) if error.is_recoverable(self.options.reject_contradictions) => {
                    if error.kind() == Kind::Contradiction {
                        self.stats.contradictions += 1;
                    }
                    outcome.errors.push(error);
                }
                Err(error) => return Err(error),
            }
        }
        Ok(())
    }

    fn execute_statement(
        &mut self,
        statement: &Statement,
        load_depth: usize,
        deadline: Option<Instant>,
        outcome: &mut LearnOutcome,
    ) -> Result<()> {
        match statement {
            Statement::Assert { subject, relation, object, polarity, .. } => {
                let s = self.interner.intern(subject)?;
                let r = self.interner.intern(relation)?;
                let o = self.interner.intern(object)?;
                let fact = Fact::new(s, r, o).with_polarity(*polarity);
                let added =
                    self.graph.assert_fact(fact, &[], &mut self.journal, &self.interner)?;
                if added == Asserted::Added {
                    outcome.facts_added += 1;
                    self.stats.facts_asserted += 1;
                }
                Ok(())
            }

            Statement::Retract { subject, relation, object, .. } => {
                let s = self.interner.intern(subject)?;
                let r = self.interner.intern(relation)?;
                let o = self.interner.intern(object)?;
                let removed = self.graph.retract(s, r, o, &mut self.journal);
                self.stats.facts_retracted += removed as u64;
                Ok(())
            }

            Statement::DefineRule { name, head, body, priority, location } => {
                let head = self.resolve_pattern(head, *location)?;
                let body = body
                    .iter()
                    .map(|p| self.resolve_pattern(p, *location))
                    .collect::<Result<Vec<_>>>()?;
                let rule = Rule::new(name, head, body).with_priority(*priority);
                self.rules.define(rule, &mut self.journal);
                outcome.rules_defined += 1;
                Ok(())
            }

            Statement::DefineDefault { ty, property, value, exceptions, .. } => {
                let ty_atom = self.interner.intern(ty)?;
                let prop = self.interner.intern(property)?;
                let val = self.interner.intern(value)?;
                let excepted = exceptions
                    .iter()
                    .map(|e| self.interner.intern(e))
                    .collect::<Result<Vec<_>>>()?;
                let default = DefaultRule::new(&format!("{ty}.{property}"), ty_atom, prop, val)
                    .with_exceptions(excepted);
                self.defaults.define(default, &mut self.journal);
                outcome.defaults_defined += 1;
                Ok(())
            }

            Statement::Bind { name, expr, persist, location } => {
                let vector = self.eval_expr(expr, *location)?;
                self.scope.set(name, vector, persist.clone(), &mut self.journal);
                outcome.scope_bound += 1;
                Ok(())
            }

            Statement::CallMacro { name, args, location } => {
                self.apply_macro(name, args, *location, deadline, outcome)
            }

            Statement::Load { path, location } => {
                if load_depth >= LOAD_DEPTH_LIMIT {
                    return Err(Error::DepthExceeded { limit: LOAD_DEPTH_LIMIT });
                }
                let resolver = self.resolver.clone().ok_or_else(|| {
                    Error::Io(format!("no source resolver installed for Load({path})"))
                })?;
                let statements = resolver.resolve(path)?;
                let _ = location;
                self.execute_program(&statements, load_depth + 1, deadline, outcome)
            }

            Statement::QueryGoal { goal, max_results, .. } => {
                // Probe inside learn: evaluated for effect on stats only
                let goal = goal.resolve(&mut self.interner)?;
                let mut call_stats = ReasoningStats::default();
                let priority = self.options.effective_priority();
                let max = max_results.unwrap_or(8);
                let config = self.kernel_config(deadline);
                let mut kernel =
                    Kernel::new(&self.graph, &self.rules, &self.defaults, &self.interner, config);
                let holo = HoloContext {
                    ops: &self.ops,
                    vocab: &self.vocab,
                    scope: &self.scope,
                    graph: &self.graph,
                    candidates: &self.candidates,
                    interner: &self.interner,
                    isa: self.isa,
                    deadline,
                };
                let result = answer_query(&mut kernel, &holo, &goal, max, priority, &mut call_stats);
                call_stats.absorb(kernel.stats());
                self.stats.absorb(&call_stats);
                result.map(|_| ())
            }
        }
    }

    fn resolve_pattern(
        &mut self,
        spec: &crate::dsl::PatternSpec,
        location: Option<crate::dsl::Location>,
    ) -> Result<TriplePattern> {
        let mut term = |token: &str| -> Result<Term> {
            match token.strip_prefix('?') {
                Some(var) if !var.is_empty() => Ok(Term::Hole(var.to_owned())),
                Some(_) => Err(Error::Parse {
                    message: "empty variable name".into(),
                    location,
                }),
                None => Ok(Term::Atom(self.interner.intern(token)?)),
            }
        };
        let subject = term(&spec.subject)?;
        let relation = term(&spec.relation)?;
        let object = term(&spec.object)?;
        Ok(TriplePattern {
            subject,
            relation,
            object,
            polarity: if spec.negated { Polarity::Neg } else { Polarity::Pos },
        })
    }

    // ========================================================================
    // Expressions & operators
    // ========================================================================

    /// Evaluate a `Bind` expression to a vector.
    ///
    /// Operator dispatch is a closed set: the `___` primitives plus tuple
    /// encoding for any interned atom in call position.
    fn eval_expr(&mut self, expr: &Expr, location: Option<crate::dsl::Location>) -> Result<Vector> {
        match expr {
            Expr::Ref(name) => match self.scope.get(name) {
                Some(entry) => Ok(entry.vector.clone()),
                None => Err(Error::UnknownConcept { name: format!("${name}"), location }),
            },
            Expr::Ident(name) => {
                self.interner.intern(name)?;
                Ok(self.vocab.get_or_create(name))
            }
            Expr::List(_) => Err(Error::Parse {
                message: "a bare list is not a vector expression".into(),
                location,
            }),
            Expr::Call { op, args } => self.eval_call(op, args, location),
        }
    }

    fn eval_call(
        &mut self,
        op: &str,
        args: &[Expr],
        location: Option<crate::dsl::Location>,
    ) -> Result<Vector> {
        let items = |args: &[Expr]| -> Vec<Expr> {
            match args {
                [Expr::List(items)] => items.clone(),
                _ => args.to_vec(),
            }
        };

        match op {
            "___Bind" => {
                let items = items(args);
                if items.len() < 2 {
                    return Err(Error::Parse {
                        message: "___Bind needs at least two operands".into(),
                        location,
                    });
                }
                let vectors = items
                    .iter()
                    .map(|e| self.eval_expr(e, location))
                    .collect::<Result<Vec<_>>>()?;
                let mut acc = vectors[0].clone();
                for v in &vectors[1..] {
                    acc = self.ops.bind(&acc, v)?;
                }
                Ok(acc)
            }

            "___Unbind" => {
                let items = items(args);
                if items.len() != 2 {
                    return Err(Error::Parse {
                        message: "___Unbind needs exactly two operands".into(),
                        location,
                    });
                }
                let c = self.eval_expr(&items[0], location)?;
                let k = self.eval_expr(&items[1], location)?;
                self.ops.unbind(&c, &k)
            }

            "___Bundle" => {
                let vectors = items(args)
                    .iter()
                    .map(|e| self.eval_expr(e, location))
                    .collect::<Result<Vec<_>>>()?;
                self.ops.bundle(&vectors)
            }

            "___Sequence" => {
                let vectors = items(args)
                    .iter()
                    .map(|e| self.eval_expr(e, location))
                    .collect::<Result<Vec<_>>>()?;
                self.ops.bundle_positioned(&vectors, &self.vocab)
            }

            "___Similarity" => Err(Error::Parse {
                message: "___Similarity yields a score, not a vector".into(),
                location,
            }),

            name if name.starts_with("___") => {
                Err(Error::UnknownOperator { name: name.to_owned(), location })
            }

            // Any other atom in call position encodes a positioned tuple
            _ => self.encode_call_tuple(op, args, location),
        }
    }

    /// Tuple encoding: `Op(a, b, c)` → bind-chain over positioned slots.
    /// Argument atoms are remembered as cleanup candidates per slot.
    fn encode_call_tuple(
        &mut self,
        op: &str,
        args: &[Expr],
        location: Option<crate::dsl::Location>,
    ) -> Result<Vector> {
        let relation = self.interner.intern(op)?;
        let mut acc = self
            .ops
            .bind(&self.vocab.get_or_create(op), &self.vocab.position(0))?;
        for (i, arg) in args.iter().enumerate() {
            let vector = self.eval_expr(arg, location)?;
            if let Expr::Ident(name) = arg {
                let atom = self.interner.intern(name)?;
                self.candidates.record(relation, i + 1, atom);
            }
            let positioned = self.ops.bind(&vector, &self.vocab.position(i + 1))?;
            acc = self.ops.bind(&acc, &positioned)?;
        }
        Ok(acc)
    }

    // ========================================================================
    // Macros
    // ========================================================================

    /// Call an existing rule as a macro: bind `args` to the head variables,
    /// solve the body, assert every instantiated head as a derived fact.
    fn apply_macro(
        &mut self,
        name: &str,
        args: &[String],
        location: Option<crate::dsl::Location>,
        deadline: Option<Instant>,
        outcome: &mut LearnOutcome,
    ) -> Result<()> {
        let Some(rule) = self.rules.get(name).cloned() else {
            return Err(Error::UnknownOperator { name: name.to_owned(), location });
        };
        let head_vars: Vec<String> =
            rule.head_variables().into_iter().map(str::to_owned).collect();
        if head_vars.len() != args.len() {
            return Err(Error::Parse {
                message: format!(
                    "macro {name} expects {} argument(s), got {}",
                    head_vars.len(),
                    args.len()
                ),
                location,
            });
        }

        let mut subst = crate::reason::unify::Subst::new();
        for (var, arg) in head_vars.iter().zip(args) {
            subst.insert(var.clone(), Term::Atom(self.interner.intern(arg)?));
        }
        let head = crate::reason::unify::apply(&rule.head, &subst);

        // Solve the body first; assertions happen after the kernel borrow ends
        let derived: Vec<(Fact, Vec<FactKey>)> = {
            let config = self.kernel_config(deadline);
            let mut kernel =
                Kernel::new(&self.graph, &self.rules, &self.defaults, &self.interner, config);
            let body: Vec<TriplePattern> = rule.body.iter().cloned().collect();
            let solutions = kernel.solve_with_bindings(&body, &subst)?;
            let stats = *kernel.stats();
            drop(kernel);
            self.stats.absorb(&stats);

            solutions
                .into_iter()
                .filter_map(|solution| {
                    let conclusion = crate::reason::unify::apply(&head, &solution);
                    let (s, r, o) = (
                        conclusion.subject.atom()?,
                        conclusion.relation.atom()?,
                        conclusion.object.atom()?,
                    );
                    let premises: Vec<FactKey> = body
                        .iter()
                        .filter_map(|p| {
                            let p = crate::reason::unify::apply(p, &solution);
                            Some(FactKey::new(
                                p.subject.atom()?,
                                p.relation.atom()?,
                                p.object.atom()?,
                                p.polarity,
                            ))
                        })
                        .collect();
                    let fact = Fact {
                        subject: s,
                        relation: r,
                        object: o,
                        polarity: conclusion.polarity,
                        source: Source::Derived,
                    };
                    Some((fact, premises))
                })
                .collect()
        };

        for (fact, premises) in derived {
            let added =
                self.graph.assert_fact(fact, &premises, &mut self.journal, &self.interner)?;
            if added == Asserted::Added {
                outcome.facts_added += 1;
                self.stats.facts_asserted += 1;
            }
        }
        Ok(())
    }

    fn kernel_config(&self, deadline: Option<Instant>) -> KernelConfig {
        KernelConfig {
            depth_limit: self.options.depth_limit,
            deadline,
            closed_world: self.options.closed_world_assumption,
            isa: self.isa,
        }
    }

    // ========================================================================
    // query / prove
    // ========================================================================

    pub fn query(&mut self, goal: &GoalSpec, opts: Option<CallOptions>) -> Result<QueryReport> {
        self.guard()?;
        let snapshot = self.journal.begin();
        let goal = goal.resolve(&mut self.interner)?;
        debug!(goal = %goal.render(&self.interner), "query");
        let deadline = self.deadline(opts.as_ref());
        let max_results = opts.and_then(|o| o.max_results).unwrap_or(8);
        let priority = self.options.effective_priority();

        let mut call_stats = ReasoningStats::default();
        let arbitration = {
            let config = self.kernel_config(deadline);
            let mut kernel =
                Kernel::new(&self.graph, &self.rules, &self.defaults, &self.interner, config);
            let holo = HoloContext {
                ops: &self.ops,
                vocab: &self.vocab,
                scope: &self.scope,
                graph: &self.graph,
                candidates: &self.candidates,
                interner: &self.interner,
                isa: self.isa,
                deadline,
            };
            let result =
                answer_query(&mut kernel, &holo, &goal, max_results, priority, &mut call_stats);
            call_stats.absorb(kernel.stats());
            result
        };
        self.stats.absorb(&call_stats);
        self.drain_codec_counters();

        match arbitration {
            Ok(arbitration) => {
                self.journal.commit(snapshot);
                let mut bindings = hashbrown::HashMap::new();
                if let Some(top) = arbitration.solutions.first() {
                    for (hole, atom) in &top.bindings {
                        bindings.insert(
                            hole.clone(),
                            Binding {
                                answer: Some(*atom),
                                method: top.method.clone(),
                                similarity: top.similarity,
                                steps: top.steps.clone(),
                            },
                        );
                    }
                }
                Ok(QueryReport {
                    success: !arbitration.solutions.is_empty(),
                    bindings,
                    all_results: arbitration.solutions,
                    holographic_confidence: arbitration.holographic_confidence,
                    reasoning_stats: self.stats,
                })
            }
            Err(error) => {
                self.rollback(snapshot);
                self.absorb_error(&error);
                Err(error)
            }
        }
    }

    pub fn prove(&mut self, goal: &GoalSpec, opts: Option<CallOptions>) -> Result<ProveReport> {
        self.guard()?;
        let snapshot = self.journal.begin();
        let goal = goal.resolve(&mut self.interner)?;
        debug!(goal = %goal.render(&self.interner), "prove");
        if !goal.is_ground() {
            return Err(Error::Parse {
                message: "prove requires a goal with zero holes".into(),
                location: None,
            });
        }
        let deadline = self.deadline(opts.as_ref());
        let priority = self.options.effective_priority();

        let mut call_stats = ReasoningStats::default();
        let outcome = {
            let config = self.kernel_config(deadline);
            let mut kernel =
                Kernel::new(&self.graph, &self.rules, &self.defaults, &self.interner, config);
            let holo = HoloContext {
                ops: &self.ops,
                vocab: &self.vocab,
                scope: &self.scope,
                graph: &self.graph,
                candidates: &self.candidates,
                interner: &self.interner,
                isa: self.isa,
                deadline,
            };
            let result = prove_goal(&mut kernel, &holo, &goal, priority, &mut call_stats);
            call_stats.absorb(kernel.stats());
            result
        };
        self.stats.absorb(&call_stats);
        self.drain_codec_counters();

        match outcome {
            Ok((proof, confidence)) => {
                self.journal.commit(snapshot);
                // A valid proof with no steps only arises from the ground
                // holographic verifier on a wide (non-triple) tuple.
                let method = proof
                    .as_ref()
                    .and_then(|steps| steps.last())
                    .map(|step| step.method.clone())
                    .or_else(|| proof.as_ref().map(|_| crate::model::Method::Holographic));
                Ok(ProveReport {
                    valid: proof.is_some(),
                    proof,
                    method,
                    holographic_confidence: confidence,
                    reasoning_stats: self.stats,
                })
            }
            Err(error) => {
                self.rollback(snapshot);
                self.absorb_error(&error);
                Err(error)
            }
        }
    }

    // ========================================================================
    // describe / check / packs / lifecycle
    // ========================================================================

    /// Human-readable rendering of an answer plus its proof summary.
    pub fn describe_result(
        &self,
        action: &str,
        result: &DescribeTarget<'_>,
        goal: &GoalSpec,
    ) -> String {
        describe::describe(&self.interner, action, result, goal)
    }

    /// Static validation of DSL text, delegated to the external parser.
    pub fn check_dsl(&self, text: &str, mode: CheckMode) -> Result<Vec<Error>> {
        match &self.parser {
            Some(parser) => Ok(parser.check(text, mode)),
            None => Err(Error::Parse {
                message: "no DSL parser installed".into(),
                location: None,
            }),
        }
    }

    /// Load a theory pack in index order; see `session::pack`.
    pub fn load_pack(&mut self, pack: &crate::dsl::TheoryPack, validate: bool) -> Result<LearnOutcome> {
        self.guard()?;
        pack::load(self, pack, validate)
    }

    /// Drop every learned artifact and return to the pristine state.
    pub fn reset(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::Internal("session is closed".into()));
        }
        let codec = build_codec(
            self.options.hdc_strategy,
            self.options.geometry,
            self.options.seed,
            self.options.exact_unbind_mode,
        );
        self.vocab = Vocabulary::new(codec.clone());
        self.ops = VectorOps::new(codec);
        self.interner = Interner::new();
        self.isa = self.interner.intern("isA")?;
        self.graph = FactGraph::new();
        self.rules = RuleStore::new();
        self.defaults = DefaultStore::new();
        self.scope = Scope::new();
        self.journal = Journal::new();
        self.candidates = CandidateIndex::new();
        self.stats = ReasoningStats::default();
        self.poisoned = false;
        debug!("session reset");
        Ok(())
    }

    /// Close the session; every later call fails.
    pub fn close(&mut self) {
        self.closed = true;
        debug!("session closed");
    }

    // Internal accessors for the pack loader
    pub(crate) fn run_program_in_open_txn(
        &mut self,
        program: &[Statement],
        outcome: &mut LearnOutcome,
    ) -> Result<()> {
        let deadline = self.deadline(None);
        self.execute_program(program, 0, deadline, outcome)
    }

    pub(crate) fn journal_begin(&self) -> Snapshot {
        self.journal.begin()
    }

    pub(crate) fn txn_finish(&mut self, snapshot: Snapshot, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                self.journal.commit(snapshot);
                self.drain_codec_counters();
                Ok(())
            }
            Err(error) => {
                self.rollback(snapshot);
                self.drain_codec_counters();
                self.absorb_error(&error);
                Err(error)
            }
        }
    }
}
