use crate::model::{AggregateResult, TrialOutcome};
use crate::report::progress::{ProgressEvent, ProgressSink};
use std::sync::Arc;

/// One console line for a progress event. Deterministic, unit-testable.
#[must_use]
pub fn format_progress_line(ev: &ProgressEvent<'_>) -> String {
    match ev {
        ProgressEvent::CandidateStarted {
            candidate,
            index,
            total,
        } => format!(
            "\nTesting {} [{}/{}] ({})...",
            candidate.name,
            index + 1,
            total,
            candidate.model
        ),
        ProgressEvent::TrialFinished {
            iteration, outcome, ..
        } => {
            let icon = match outcome {
                TrialOutcome::Completed { passed: true, .. } => "✅",
                _ => "❌",
            };
            match outcome {
                TrialOutcome::Errored { message } => {
                    format!("   - Run {}: {} {}: {}", iteration, icon, outcome.label(), message)
                }
                TrialOutcome::Completed { .. } => {
                    format!("   - Run {}: {} {}", iteration, icon, outcome.label())
                }
            }
        }
    }
}

/// Sink that prints every progress event to stderr.
pub fn console_progress_sink() -> ProgressSink {
    Arc::new(|ev: ProgressEvent<'_>| eprintln!("{}", format_progress_line(&ev)))
}

#[must_use]
pub fn format_summary(results: &[AggregateResult]) -> String {
    let name_width = results
        .iter()
        .map(|r| r.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Agent Model".len());

    let mut out = format!(
        "{:<w$}  {:>11}  {:>10}  {:>8}\n",
        "Agent Model",
        "Consistency",
        "Avg Tokens",
        "Security",
        w = name_width
    );
    for r in results {
        out.push_str(&format!(
            "{:<w$}  {:>11}  {:>10}  {:>8}\n",
            r.name,
            r.consistency_label(),
            r.avg_tokens,
            r.total_security,
            w = name_width
        ));
    }
    out
}

pub fn print_summary(results: &[AggregateResult]) {
    eprintln!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    eprint!("{}", format_summary(results));
}
