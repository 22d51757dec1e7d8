//! Decision pass orchestration.

use adforge_core::{AnalysisReport, BrainFailureOutput, Decision, FailureMode, ScoringPolicy};

use crate::generator::generate_candidates;
use crate::scorer::{rank_strategies, score_candidates};
use crate::selector::select_strategy;

/// Run one full decision pass over an analysis report.
///
/// 1. No problem at or above the severity floor → `NO_ACTION`.
/// 2. Fewer segments than `policy.min_segments` → `NEEDS_MORE_DATA`.
/// 3. Generate candidates, score, rank, and select.
///
/// Policy failures are returned as [`Decision::Failed`], never as errors, so
/// callers can show them without aborting.
#[must_use]
pub fn generate_selection(report: &AnalysisReport, policy: &ScoringPolicy) -> Decision {
    let eligible = report.problems_above(policy.severity_floor).len();
    if eligible == 0 {
        tracing::info!(
            problems = report.problems.len(),
            floor = policy.severity_floor,
            "no problem reaches the severity floor"
        );
        return Decision::Failed(BrainFailureOutput {
            mode: FailureMode::NoAction,
            reason: format!(
                "video is performing well: no detected problem reaches severity {:.2}",
                policy.severity_floor
            ),
            fallback_suggestion: None,
        });
    }

    if report.segments.len() < policy.min_segments {
        tracing::info!(
            segments = report.segments.len(),
            required = policy.min_segments,
            "not enough segments to score reliably"
        );
        return Decision::Failed(BrainFailureOutput {
            mode: FailureMode::NeedsMoreData,
            reason: format!(
                "analysis has {} segment(s); at least {} are needed to score strategies",
                report.segments.len(),
                policy.min_segments
            ),
            fallback_suggestion: None,
        });
    }

    let candidates = generate_candidates(report, policy);
    let scored = score_candidates(report, &candidates, policy);
    let ranked = rank_strategies(scored);

    tracing::debug!(
        candidates = candidates.len(),
        eligible_problems = eligible,
        "scored strategy candidates"
    );

    let decision = select_strategy(ranked, policy);
    match &decision {
        Decision::Selected(selection) => tracing::info!(
            strategy = %selection.strategy.strategy_id,
            framework = %selection.strategy.framework,
            final_score = selection.strategy.final_score,
            "strategy selected"
        ),
        Decision::Failed(failure) => tracing::info!(
            mode = ?failure.mode,
            reason = %failure.reason,
            "no strategy selected"
        ),
    }
    decision
}
