//! Textual rendering of answers and proofs.
//!
//! Pure functions over the answer DTOs — the NL adapter consumes these
//! strings verbatim, so formatting stays stable and deterministic.

use crate::model::{GoalSpec, Interner, ProveReport, QueryReport};

/// Which kind of result is being described.
pub enum DescribeTarget<'a> {
    Query(&'a QueryReport),
    Prove(&'a ProveReport),
}

/// Render an answer plus a proof summary.
pub fn describe(
    interner: &Interner,
    action: &str,
    target: &DescribeTarget<'_>,
    goal: &GoalSpec,
) -> String {
    let goal_text = render_goal(goal);
    match target {
        DescribeTarget::Query(report) => {
            let mut out = String::new();
            if report.success {
                out.push_str(&format!("{action} {goal_text}: success\n"));
                let mut holes: Vec<&String> = report.bindings.keys().collect();
                holes.sort();
                for hole in holes {
                    let binding = &report.bindings[hole];
                    let answer = binding
                        .answer
                        .map(|a| interner.name(a).to_owned())
                        .unwrap_or_else(|| "∅".to_owned());
                    out.push_str(&format!("  ?{hole} = {answer} [{}]", binding.method.tag()));
                    if let Some(sim) = binding.similarity {
                        out.push_str(&format!(" sim={sim:.3}"));
                    }
                    out.push('\n');
                    for step in &binding.steps {
                        out.push_str(&format!("    {}\n", step.render(interner)));
                    }
                }
                if report.all_results.len() > 1 {
                    out.push_str(&format!(
                        "  ({} solutions total)\n",
                        report.all_results.len()
                    ));
                }
            } else {
                out.push_str(&format!("{action} {goal_text}: no answer\n"));
            }
            out
        }
        DescribeTarget::Prove(report) => {
            let mut out = String::new();
            if report.valid {
                let method = report
                    .method
                    .as_ref()
                    .map(|m| m.tag())
                    .unwrap_or_else(|| "unknown".to_owned());
                out.push_str(&format!("{action} {goal_text}: valid [{method}]\n"));
                if let Some(proof) = &report.proof {
                    for step in proof {
                        out.push_str(&format!("  {}\n", step.render(interner)));
                    }
                }
            } else {
                out.push_str(&format!("{action} {goal_text}: not derivable\n"));
            }
            if let Some(confidence) = report.holographic_confidence {
                out.push_str(&format!("  (holographic confidence {confidence:.3})\n"));
            }
            out
        }
    }
}

fn render_goal(goal: &GoalSpec) -> String {
    format!("{}({})", goal.relation, goal.args.join(", "))
}
