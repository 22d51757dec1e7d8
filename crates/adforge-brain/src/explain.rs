//! Human-readable rationale for a decision.
//!
//! Every number quoted here comes straight from a [`ScoredStrategy`] so the
//! text can be checked against the breakdown.

use adforge_core::{ConfidenceLevel, Explanation, FallbackSuggestion, ScoredStrategy};

fn action_list(strategy: &ScoredStrategy) -> String {
    strategy
        .actions
        .iter()
        .map(|a| format!("{} on {}", a.action, a.target_segment_type))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Sentence naming the largest positive breakdown term of the winner.
#[must_use]
pub fn why_this_strategy(winner: &ScoredStrategy) -> String {
    let b = &winner.breakdown;
    let (term, value) = if b.trust_bonus > b.impact_contribution {
        ("evidence strength", b.trust_bonus)
    } else {
        ("expected impact", b.impact_contribution)
    };
    format!(
        "{} ({}) selected: largest contribution is {term} (+{value:.3} of final score {:.3}); \
         addresses {} problem(s) via {}",
        winner.strategy_id,
        winner.framework,
        winner.final_score,
        winner.target_problem_ids.len(),
        action_list(winner),
    )
}

/// Sentence explaining why `other` lost to `winner`, citing its weakest sub-score.
#[must_use]
pub fn why_not(other: &ScoredStrategy, winner: &ScoredStrategy) -> String {
    let display = [
        ("impact", other.impact_score),
        ("safety", other.safety()),
        ("affordability", other.affordability()),
        ("confidence", other.confidence_score),
    ];
    let (name, value) = display
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or(("impact", other.impact_score));
    format!(
        "{} ({}) not chosen: weakest on {name} ({value:.2}); final score {:.3} vs {:.3}",
        other.strategy_id, other.framework, other.final_score, winner.final_score,
    )
}

#[must_use]
pub fn expected_outcome(winner: &ScoredStrategy) -> String {
    format!(
        "expected to cut weighted problem severity by about {:.0}% with {:.0}% safety margin",
        winner.impact_score * 100.0,
        winner.safety() * 100.0,
    )
}

/// Build the full explanation for a winner and its runners-up.
#[must_use]
pub fn explain(winner: &ScoredStrategy, runners_up: &[ScoredStrategy]) -> Explanation {
    Explanation {
        why_this_strategy: why_this_strategy(winner),
        why_not_others: runners_up.iter().map(|o| why_not(o, winner)).collect(),
        confidence_level: ConfidenceLevel::from_score(winner.confidence_score),
        expected_outcome: expected_outcome(winner),
    }
}

#[must_use]
pub fn fallback_suggestion(strategy: &ScoredStrategy, risk_ceiling: f64) -> FallbackSuggestion {
    let summary = if strategy.risk_score > risk_ceiling {
        format!(
            "least risky option ({}) still exceeds the risk ceiling {risk_ceiling:.2} at {:.2}; \
             apply only its low-risk edits manually",
            strategy.framework, strategy.risk_score
        )
    } else {
        format!(
            "safer {} strategy within the risk ceiling ({:.2} ≤ {risk_ceiling:.2}): {}",
            strategy.framework,
            strategy.risk_score,
            action_list(strategy)
        )
    };
    FallbackSuggestion {
        strategy_id: strategy.strategy_id.clone(),
        framework: strategy.framework,
        risk_score: strategy.risk_score,
        final_score: strategy.final_score,
        summary,
    }
}
