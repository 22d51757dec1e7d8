//! Winner selection under policy thresholds.

use adforge_core::{
    BrainFailureOutput, Decision, FailureMode, ScoredStrategy, ScoringPolicy, SelectionResult,
};

use crate::explain::{explain, fallback_suggestion};

fn failure(mode: FailureMode, reason: String) -> Decision {
    Decision::Failed(BrainFailureOutput {
        mode,
        reason,
        fallback_suggestion: None,
    })
}

/// Pick the winner from strategies already ranked by [`crate::rank_strategies`].
///
/// Policy checks, in order:
/// 1. no strategy, or every impact below `impact_floor` → `NO_ACTION`.
/// 2. top strategy above `risk_ceiling` → `SAFE_OPTIMIZATION_ONLY` with the
///    best strategy inside the ceiling as fallback, or the least risky one
///    when none fits.
/// 3. top `final_score` below `min_acceptance_score` → `NO_ACTION`.
///
/// Otherwise the top strategy wins and the rest become explained runners-up.
#[must_use]
pub fn select_strategy(ranked: Vec<ScoredStrategy>, policy: &ScoringPolicy) -> Decision {
    let Some(top) = ranked.first() else {
        return failure(
            FailureMode::NoAction,
            "no strategy candidates to choose from".to_string(),
        );
    };

    if ranked.iter().all(|s| s.impact_score < policy.impact_floor) {
        return failure(
            FailureMode::NoAction,
            format!(
                "video is performing well: no strategy reaches the impact floor {:.2}",
                policy.impact_floor
            ),
        );
    }

    if top.risk_score > policy.risk_ceiling {
        let safer = ranked
            .iter()
            .find(|s| s.risk_score <= policy.risk_ceiling)
            .or_else(|| {
                ranked
                    .iter()
                    .min_by(|a, b| a.risk_score.total_cmp(&b.risk_score))
            });
        tracing::info!(
            top = %top.strategy_id,
            risk = top.risk_score,
            ceiling = policy.risk_ceiling,
            "top strategy exceeds risk ceiling"
        );
        return Decision::Failed(BrainFailureOutput {
            mode: FailureMode::SafeOptimizationOnly,
            reason: format!(
                "best strategy {} has risk {:.2} above the ceiling {:.2}",
                top.strategy_id, top.risk_score, policy.risk_ceiling
            ),
            fallback_suggestion: safer.map(|s| fallback_suggestion(s, policy.risk_ceiling)),
        });
    }

    if top.final_score < policy.min_acceptance_score {
        return failure(
            FailureMode::NoAction,
            format!(
                "best strategy {} scores {:.3}, below the acceptance threshold {:.3}",
                top.strategy_id, top.final_score, policy.min_acceptance_score
            ),
        );
    }

    let mut ranked = ranked;
    let strategy = ranked.remove(0);
    let runners_up = ranked;
    let explanation = explain(&strategy, &runners_up);

    Decision::Selected(SelectionResult {
        strategy,
        runners_up,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use adforge_core::{Framework, HookType, ScoreBreakdown};

    use super::*;

    fn strategy(id: &str, impact: f64, risk: f64, final_score: f64) -> ScoredStrategy {
        ScoredStrategy {
            strategy_id: id.to_string(),
            framework: Framework::ProblemSolution,
            hook_type: HookType::PainPoint,
            actions: vec![],
            target_problem_ids: BTreeSet::from([0]),
            impact_score: impact,
            risk_score: risk,
            cost_score: 0.3,
            confidence_score: 0.6,
            final_score,
            breakdown: ScoreBreakdown {
                impact_contribution: final_score,
                ..ScoreBreakdown::default()
            },
        }
    }

    #[test]
    fn empty_input_is_no_action() {
        let decision = select_strategy(vec![], &ScoringPolicy::default());
        assert_eq!(decision.failure().unwrap().mode, FailureMode::NoAction);
    }

    #[test]
    fn low_impact_everywhere_is_no_action() {
        let decision = select_strategy(
            vec![strategy("a", 0.1, 0.1, 0.3), strategy("b", 0.05, 0.1, 0.2)],
            &ScoringPolicy::default(),
        );
        let failure = decision.failure().unwrap();
        assert_eq!(failure.mode, FailureMode::NoAction);
        assert!(failure.reason.contains("performing well"));
        assert!(failure.fallback_suggestion.is_none());
    }

    #[test]
    fn all_candidates_above_risk_ceiling_suggest_least_risky() {
        let decision = select_strategy(
            vec![
                strategy("a", 0.9, 0.95, 0.4),
                strategy("b", 0.7, 0.95, 0.3),
                strategy("c", 0.6, 0.95, 0.2),
            ],
            &ScoringPolicy::default(),
        );
        let failure = decision.failure().unwrap();
        assert_eq!(failure.mode, FailureMode::SafeOptimizationOnly);
        let fallback = failure.fallback_suggestion.as_ref().unwrap();
        // Equal risk: first in rank order.
        assert_eq!(fallback.strategy_id, "a");
        assert!(fallback.summary.contains("exceeds the risk ceiling"));
    }

    #[test]
    fn risky_winner_falls_back_to_best_safe_candidate() {
        let decision = select_strategy(
            vec![
                strategy("risky", 0.9, 0.9, 0.5),
                strategy("mid", 0.6, 0.85, 0.4),
                strategy("safe", 0.4, 0.2, 0.3),
                strategy("safer", 0.3, 0.1, 0.2),
            ],
            &ScoringPolicy::default(),
        );
        let failure = decision.failure().unwrap();
        assert_eq!(failure.mode, FailureMode::SafeOptimizationOnly);
        assert_eq!(
            failure.fallback_suggestion.as_ref().unwrap().strategy_id,
            "safe"
        );
    }

    #[test]
    fn score_below_acceptance_is_no_action() {
        let decision = select_strategy(
            vec![strategy("a", 0.5, 0.1, 0.01)],
            &ScoringPolicy::default(),
        );
        let failure = decision.failure().unwrap();
        assert_eq!(failure.mode, FailureMode::NoAction);
        assert!(failure.reason.contains("acceptance threshold"));
    }

    #[test]
    fn winner_is_top_ranked_with_explained_runners_up() {
        let decision = select_strategy(
            vec![
                strategy("a", 0.8, 0.2, 0.5),
                strategy("b", 0.6, 0.2, 0.4),
                strategy("c", 0.4, 0.2, 0.3),
            ],
            &ScoringPolicy::default(),
        );
        let selection = decision.selection().unwrap();
        assert_eq!(selection.strategy.strategy_id, "a");
        assert_eq!(selection.runners_up.len(), 2);
        assert_eq!(selection.explanation.why_not_others.len(), 2);
        assert!(selection.explanation.why_not_others[0].starts_with('b'));
    }
}
