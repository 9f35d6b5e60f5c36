//! End-to-end tests for the session façade: priority arbitration,
//! deterministic replay, statistics, theory packs, and lifecycle.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use sys2::{
    CallOptions, Expr, Goal, Kind, Method, PatternSpec, ReasoningPriority, Session,
    SessionOptions, SourceResolver, Statement, TheoryPack,
};

// ============================================================================
// 1. Priority arbitration (spec seed scenario 5)
// ============================================================================

#[test]
fn test_exact_lookup_wins_under_holographic_priority() {
    let mut session = Session::new(
        SessionOptions::default().with_priority(ReasoningPriority::Holographic),
    )
    .unwrap();
    session
        .learn(&[
            Statement::assert("dog", "isA", "mammal"),
            // A scope bundle that also encodes the same triple
            Statement::bind(
                "memory",
                Expr::call(
                    "isA",
                    vec![Expr::ident("dog"), Expr::ident("mammal")],
                ),
            ),
        ])
        .unwrap();

    let report = session
        .prove(&Goal::triple("dog", "isA", "mammal"), None)
        .unwrap();
    assert!(report.valid);
    assert_eq!(
        report.method,
        Some(Method::Exact),
        "a fact in the graph must win over any similarity score"
    );
}

#[test]
fn test_holographic_priority_still_answers_from_vectors() {
    let mut session = Session::new(
        SessionOptions::default().with_priority(ReasoningPriority::Holographic),
    )
    .unwrap();
    let tuples: Vec<Expr> = (1..=5)
        .map(|i| {
            Expr::call(
                "Stores",
                vec![Expr::ident("Box1"), Expr::ident(&format!("item{i}"))],
            )
        })
        .collect();
    session
        .learn(&[Statement::bind(
            "box",
            Expr::call("___Bundle", vec![Expr::List(tuples)]),
        )])
        .unwrap();

    let report = session
        .query(&Goal::tuple("Stores", &["Box1", "?what"]), None)
        .unwrap();
    assert!(report.success);
    assert_eq!(report.bindings["what"].method, Method::Holographic);
}

#[test]
fn test_symbolic_priority_prefers_rule_over_decode() {
    let mut session = Session::new(
        SessionOptions::default().with_priority(ReasoningPriority::Symbolic),
    )
    .unwrap();
    session
        .learn(&[
            Statement::assert("dog", "isA", "mammal"),
            Statement::assert("mammal", "isA", "animal"),
            Statement::rule(
                "transIsA",
                PatternSpec::new("?x", "isA", "?z"),
                vec![
                    PatternSpec::new("?x", "isA", "?y"),
                    PatternSpec::new("?y", "isA", "?z"),
                ],
            ),
        ])
        .unwrap();

    let report = session
        .query(&Goal::triple("dog", "isA", "?x"), Some(CallOptions::max_results(5)))
        .unwrap();
    assert!(report.success);
    assert!(report
        .all_results
        .iter()
        .all(|s| !matches!(s.method, Method::Holographic)));
}

// ============================================================================
// 2. Deterministic replay (spec seed scenario 6)
// ============================================================================

fn replay_suite(session: &mut Session) -> (sys2::QueryReport, sys2::QueryReport) {
    session
        .learn(&[
            Statement::assert("dog", "isA", "mammal"),
            Statement::assert("cat", "isA", "mammal"),
            Statement::assert("mammal", "isA", "animal"),
            Statement::rule(
                "transIsA",
                PatternSpec::new("?x", "isA", "?z"),
                vec![
                    PatternSpec::new("?x", "isA", "?y"),
                    PatternSpec::new("?y", "isA", "?z"),
                ],
            ),
            Statement::default_rule("mammal", "warmBlooded", "true", &[]),
            Statement::bind(
                "pair",
                Expr::call("Likes", vec![Expr::ident("dog"), Expr::ident("cat")]),
            ),
        ])
        .unwrap();
    let a = session
        .query(&Goal::triple("dog", "isA", "?x"), Some(CallOptions::max_results(8)))
        .unwrap();
    let b = session
        .query(&Goal::triple("?x", "warmBlooded", "true"), Some(CallOptions::max_results(8)))
        .unwrap();
    (a, b)
}

#[test]
fn test_identical_runs_produce_identical_answers_and_stats() {
    let mut first = Session::new(SessionOptions::default().with_seed(7)).unwrap();
    let mut second = Session::new(SessionOptions::default().with_seed(7)).unwrap();

    let (a1, b1) = replay_suite(&mut first);
    let (a2, b2) = replay_suite(&mut second);

    assert_eq!(a1.all_results, a2.all_results);
    assert_eq!(b1.all_results, b2.all_results);
    assert_eq!(first.stats(), second.stats());
}

#[test]
fn test_different_seed_changes_vectors_not_answers() {
    let mut first = Session::new(SessionOptions::default().with_seed(1)).unwrap();
    let mut second = Session::new(SessionOptions::default().with_seed(2)).unwrap();

    let (a1, _) = replay_suite(&mut first);
    let (a2, _) = replay_suite(&mut second);

    // Symbolic answers are seed-independent
    let names = |r: &sys2::QueryReport, s: &Session| -> Vec<String> {
        r.all_results
            .iter()
            .map(|sol| s.interner().name(sol.bindings["x"]).to_owned())
            .collect()
    };
    assert_eq!(names(&a1, &first), names(&a2, &second));
}

// ============================================================================
// 3. Statistics surface
// ============================================================================

#[test]
fn test_stats_accumulate_until_reset() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session
        .learn(&[
            Statement::assert("dog", "isA", "mammal"),
            Statement::assert("mammal", "isA", "animal"),
            Statement::rule(
                "transIsA",
                PatternSpec::new("?x", "isA", "?z"),
                vec![
                    PatternSpec::new("?x", "isA", "?y"),
                    PatternSpec::new("?y", "isA", "?z"),
                ],
            ),
        ])
        .unwrap();

    session.prove(&Goal::triple("dog", "isA", "animal"), None).unwrap();
    let after_one = session.stats();
    assert_eq!(after_one.facts_asserted, 2);
    assert!(after_one.rule_firings >= 1);

    session.prove(&Goal::triple("dog", "isA", "animal"), None).unwrap();
    let after_two = session.stats();
    assert!(after_two.rule_firings > after_one.rule_firings);

    session.reset().unwrap();
    assert_eq!(session.stats(), sys2::ReasoningStats::default());
    assert_eq!(session.fact_count(), 0);
}

#[test]
fn test_stats_json_is_valid() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session
        .learn(&[Statement::assert("dog", "isA", "mammal")])
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&session.stats_json()).unwrap();
    assert_eq!(json["facts_asserted"], 1);
}

// ============================================================================
// 4. Theory packs
// ============================================================================

#[test]
fn test_pack_loads_in_index_order() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    let pack = TheoryPack::new()
        .with_entry(
            "taxonomy.sys2",
            vec![
                Statement::assert("dog", "isA", "mammal"),
                Statement::assert("mammal", "isA", "animal"),
            ],
        )
        .with_entry(
            "rules.sys2",
            vec![Statement::rule(
                "transIsA",
                PatternSpec::new("?x", "isA", "?z"),
                vec![
                    PatternSpec::new("?x", "isA", "?y"),
                    PatternSpec::new("?y", "isA", "?z"),
                ],
            )],
        )
        .with_order(&["taxonomy.sys2", "rules.sys2"]);

    let outcome = session.load_pack(&pack, true).unwrap();
    assert!(outcome.success);
    assert_eq!(outcome.facts_added, 2);
    assert_eq!(outcome.rules_defined, 1);
    assert!(session
        .prove(&Goal::triple("dog", "isA", "animal"), None)
        .unwrap()
        .valid);
}

#[test]
fn test_pack_missing_entry_errors_only_when_validating() {
    let pack = TheoryPack::new()
        .with_entry("a.sys2", vec![Statement::assert("x", "r", "y")])
        .with_order(&["a.sys2", "ghost.sys2"]);

    let mut strict = Session::new(SessionOptions::default()).unwrap();
    let err = strict.load_pack(&pack, true).unwrap_err();
    assert_eq!(err.kind(), Kind::Io);
    assert_eq!(strict.fact_count(), 0, "validated load is atomic");

    let mut lenient = Session::new(SessionOptions::default()).unwrap();
    let outcome = lenient.load_pack(&pack, false).unwrap();
    assert!(outcome.success);
    assert_eq!(lenient.fact_count(), 1);
}

// ============================================================================
// 5. Load via the external resolver
// ============================================================================

struct FixedResolver;

impl SourceResolver for FixedResolver {
    fn resolve(&self, path: &str) -> sys2::Result<Vec<Statement>> {
        match path {
            "base.sys2" => Ok(vec![Statement::assert("dog", "isA", "mammal")]),
            "loop.sys2" => Ok(vec![Statement::load("loop.sys2")]),
            _ => Err(sys2::Error::Io(format!("unknown source {path}"))),
        }
    }
}

#[test]
fn test_load_statement_pulls_sub_program() {
    let mut session = Session::new(SessionOptions::default())
        .unwrap()
        .with_resolver(Arc::new(FixedResolver));
    let outcome = session.learn(&[Statement::load("base.sys2")]).unwrap();
    assert_eq!(outcome.facts_added, 1);
}

#[test]
fn test_load_recursion_is_bounded() {
    let mut session = Session::new(SessionOptions::default())
        .unwrap()
        .with_resolver(Arc::new(FixedResolver));
    let err = session.learn(&[Statement::load("loop.sys2")]).unwrap_err();
    assert_eq!(err.kind(), Kind::DepthExceeded);
    assert_eq!(session.fact_count(), 0);
}

#[test]
fn test_load_without_resolver_is_io_error() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    let err = session.learn(&[Statement::load("base.sys2")]).unwrap_err();
    assert_eq!(err.kind(), Kind::Io);
}

// ============================================================================
// 6. Macros and operators
// ============================================================================

#[test]
fn test_unknown_macro_is_unknown_operator() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    let err = session
        .learn(&[Statement::call_macro("noSuchRule", &["a"])])
        .unwrap_err();
    assert_eq!(err.kind(), Kind::UnknownOperator);
}

#[test]
fn test_unknown_primitive_operator_rejected() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    let err = session
        .learn(&[Statement::bind(
            "v",
            Expr::call("___Convolve", vec![Expr::ident("a"), Expr::ident("b")]),
        )])
        .unwrap_err();
    assert_eq!(err.kind(), Kind::UnknownOperator);
}

#[test]
fn test_missing_scope_reference_is_recoverable() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    let outcome = session
        .learn(&[
            Statement::bind("v", Expr::scope_ref("ghost")),
            Statement::assert("dog", "isA", "mammal"),
        ])
        .unwrap();
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].kind(), Kind::UnknownConcept);
    // Later statements still executed
    assert_eq!(session.fact_count(), 1);
}

// ============================================================================
// 7. Lifecycle
// ============================================================================

#[test]
fn test_check_dsl_without_parser_fails() {
    let session = Session::new(SessionOptions::default()).unwrap();
    let err = session.check_dsl("anything", sys2::CheckMode::Strict).unwrap_err();
    assert_eq!(err.kind(), Kind::Parse);
}

#[test]
fn test_closed_session_refuses_calls() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.close();
    let err = session
        .learn(&[Statement::assert("a", "b", "c")])
        .unwrap_err();
    assert_eq!(err.kind(), Kind::Internal);
}

#[test]
fn test_reset_restores_a_usable_session() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session
        .learn(&[Statement::assert("dog", "isA", "mammal")])
        .unwrap();
    session.reset().unwrap();
    assert_eq!(session.fact_count(), 0);

    session
        .learn(&[Statement::assert("cat", "isA", "mammal")])
        .unwrap();
    assert!(session
        .prove(&Goal::triple("cat", "isA", "mammal"), None)
        .unwrap()
        .valid);
}
