//! End-to-end tests for typed defaults: firing, exceptions, explicit-fact
//! suppression, and re-enabling after retraction.

use pretty_assertions::assert_eq;
use sys2::{Goal, Method, Session, SessionOptions, Statement};

fn bird_theory() -> Vec<Statement> {
    vec![
        Statement::assert("robin", "isA", "bird"),
        Statement::assert("penguin", "isA", "bird"),
        Statement::default_rule("bird", "canFly", "true", &["penguin"]),
    ]
}

// ============================================================================
// 1. Default fires for a typed, unexcepted subject (spec seed scenario)
// ============================================================================

#[test]
fn test_default_fires_for_robin() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.learn(&bird_theory()).unwrap();

    let report = session
        .query(&Goal::triple("robin", "canFly", "true"), None)
        .unwrap();
    assert!(report.success);
    assert_eq!(
        report.all_results[0].method,
        Method::Default("bird.canFly".into())
    );
    // The firing rests on the typing premise
    let root = report.all_results[0].steps.last().unwrap();
    assert_eq!(root.premises.len(), 1);
    assert_eq!(session.stats().default_firings, 1);
}

#[test]
fn test_default_conclusion_carries_default_source() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.learn(&bird_theory()).unwrap();
    let report = session
        .query(&Goal::triple("robin", "canFly", "true"), None)
        .unwrap();
    let root = report.all_results[0].steps.last().unwrap();
    assert_eq!(root.conclusion.source, sys2::Source::Default);
}

// ============================================================================
// 2. Exceptions block the default
// ============================================================================

#[test]
fn test_excepted_subject_does_not_fire() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.learn(&bird_theory()).unwrap();

    let report = session
        .query(&Goal::triple("penguin", "canFly", "true"), None)
        .unwrap();
    assert!(!report.success);
    assert_eq!(session.stats().default_firings, 0);
}

// ============================================================================
// 3. Explicit facts suppress; retraction re-enables
// ============================================================================

#[test]
fn test_explicit_fact_suppresses_default() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.learn(&bird_theory()).unwrap();

    // An explicit opposite claim occupies (robin, canFly, *)
    session
        .learn(&[Statement::assert("robin", "canFly", "false")])
        .unwrap();
    let report = session
        .query(&Goal::triple("robin", "canFly", "true"), None)
        .unwrap();
    assert!(!report.success, "explicit fact must override the default");

    // Retracting the explicit fact re-enables the default
    session
        .learn(&[Statement::retract("robin", "canFly", "false")])
        .unwrap();
    let report = session
        .query(&Goal::triple("robin", "canFly", "true"), None)
        .unwrap();
    assert!(report.success);
    assert_eq!(
        report.all_results[0].method,
        Method::Default("bird.canFly".into())
    );
}

#[test]
fn test_explicit_fact_blocks_default_even_after_typing_grows() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session.learn(&bird_theory()).unwrap();
    session
        .learn(&[Statement::assert("penguin", "canFly", "false")])
        .unwrap();

    // Excepted AND explicitly false: still no default firing
    let report = session
        .query(&Goal::triple("penguin", "canFly", "true"), None)
        .unwrap();
    assert!(!report.success);
    assert_eq!(session.stats().default_firings, 0);
}

// ============================================================================
// 4. Typing may itself be rule-derived
// ============================================================================

#[test]
fn test_default_typing_premise_can_come_from_a_rule() {
    let mut session = Session::new(SessionOptions::default()).unwrap();
    session
        .learn(&[
            Statement::assert("robin", "isA", "songbird"),
            Statement::assert("songbird", "isA", "bird"),
            Statement::rule(
                "transIsA",
                sys2::PatternSpec::new("?x", "isA", "?z"),
                vec![
                    sys2::PatternSpec::new("?x", "isA", "?y"),
                    sys2::PatternSpec::new("?y", "isA", "?z"),
                ],
            ),
            Statement::default_rule("bird", "canFly", "true", &[]),
        ])
        .unwrap();

    let report = session
        .query(&Goal::triple("robin", "canFly", "true"), None)
        .unwrap();
    assert!(report.success, "robin isA bird holds through transIsA");
    assert_eq!(
        report.all_results[0].method,
        Method::Default("bird.canFly".into())
    );
}
