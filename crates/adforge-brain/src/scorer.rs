//! Multi-criteria strategy scorer.
//!
//! Each candidate gets four sub-scores in `[0, 1]` and a signed breakdown from
//! which `final_score` is recomputed exactly:
//!
//! ```text
//! final = w_i·impact − w_r·risk − w_c·cost + w_t·trust_bonus(confidence)
//! ```

use adforge_core::{
    ActionKind, AnalysisReport, DetectedProblem, Framework, ProblemType, ScoreBreakdown,
    ScoredStrategy, ScoringPolicy, StrategyCandidate,
};

/// How well `action` addresses `problem_type`, in `[0, 1]`.
fn action_fit(action: ActionKind, problem_type: ProblemType) -> f64 {
    use ActionKind as A;
    use ProblemType as P;

    match (problem_type, action) {
        (P::WeakHook, A::ReplaceHook)
        | (P::PoorClarity, A::AddCaptions)
        | (P::WeakCta, A::StrengthenCta)
        | (P::SlowPacing, A::SpeedUp) => 1.0,
        (P::LowAttention, A::TrimSegment | A::SpeedUp) | (P::LowRetention, A::ReorderSegments) => {
            0.9
        }
        (P::SlowPacing, A::TrimSegment) => 0.8,
        (P::PoorClarity, A::AddTextOverlay) => 0.7,
        (P::WeakHook, A::AddTextOverlay | A::ReorderSegments)
        | (P::WeakCta, A::AddTextOverlay | A::AddSocialProof)
        | (P::LowRetention, A::TrimSegment | A::AddSocialProof) => 0.6,
        (P::LowAttention, A::ReorderSegments | A::ReplaceHook) => 0.5,
        _ => 0.0,
    }
}

/// How naturally `framework` frames a fix for `problem_type`, in `[0.65, 1]`.
fn framework_affinity(framework: Framework, problem_type: ProblemType) -> f64 {
    use Framework as F;
    use ProblemType as P;

    match (framework, problem_type) {
        (F::ProblemSolution, P::PoorClarity)
        | (F::Aida, P::LowAttention)
        | (F::Pas, P::WeakHook)
        | (F::SocialProof, P::WeakCta) => 1.0,
        (F::ProblemSolution | F::Aida, P::WeakCta)
        | (F::Aida, P::WeakHook)
        | (F::Pas, P::LowRetention)
        | (F::BeforeAfter, P::PoorClarity) => 0.9,
        (F::BeforeAfter, P::LowRetention) => 0.85,
        (F::ProblemSolution, _) | (F::SocialProof, P::LowRetention) => 0.8,
        (F::Aida | F::Pas, _) => 0.75,
        (F::BeforeAfter, _) => 0.7,
        (F::SocialProof, _) => 0.65,
    }
}

/// Chance an action degrades the segment it touches when that segment is healthy.
fn base_risk(action: ActionKind) -> f64 {
    match action {
        ActionKind::ReorderSegments => 0.4,
        ActionKind::ReplaceHook => 0.35,
        ActionKind::TrimSegment => 0.25,
        ActionKind::SpeedUp => 0.2,
        ActionKind::StrengthenCta | ActionKind::AddSocialProof => 0.15,
        ActionKind::AddTextOverlay | ActionKind::AddCaptions => 0.05,
    }
}

/// Relative render/editing effort of an action.
fn cost_units(action: ActionKind) -> f64 {
    match action {
        ActionKind::ReplaceHook => 1.5,
        ActionKind::AddSocialProof => 1.25,
        ActionKind::ReorderSegments | ActionKind::StrengthenCta => 1.0,
        ActionKind::AddCaptions => 0.75,
        ActionKind::TrimSegment | ActionKind::AddTextOverlay | ActionKind::SpeedUp => 0.5,
    }
}

fn problem_weight(problem: &DetectedProblem, policy: &ScoringPolicy) -> f64 {
    if problem.severity > policy.impact_severity_pivot {
        policy.high_severity_weight
    } else {
        1.0
    }
}

fn impact_score(
    report: &AnalysisReport,
    candidate: &StrategyCandidate,
    policy: &ScoringPolicy,
) -> f64 {
    let total: f64 = report
        .problems_above(policy.severity_floor)
        .iter()
        .map(|(_, p)| problem_weight(p, policy) * p.severity)
        .sum();
    if total <= 0.0 {
        return 0.0;
    }

    let reduced: f64 = candidate
        .target_problem_ids
        .iter()
        .filter_map(|id| report.problems.get(*id))
        .map(|p| {
            let best_fit = candidate
                .actions
                .iter()
                .map(|a| action_fit(a.action, p.problem_type))
                .fold(0.0_f64, f64::max);
            let effectiveness = framework_affinity(candidate.framework, p.problem_type) * best_fit;
            problem_weight(p, policy) * p.severity * effectiveness
        })
        .sum();

    (reduced / total).clamp(0.0, 1.0)
}

fn risk_score(report: &AnalysisReport, candidate: &StrategyCandidate) -> f64 {
    let survive: f64 = candidate
        .actions
        .iter()
        .map(|a| {
            let exposure = 0.3 + 0.7 * report.healthy_fraction(a.target_segment_type);
            1.0 - base_risk(a.action) * exposure
        })
        .product();
    (1.0 - survive).clamp(0.0, 1.0)
}

fn cost_score(candidate: &StrategyCandidate, policy: &ScoringPolicy) -> f64 {
    let units: f64 = candidate.actions.iter().map(|a| cost_units(a.action)).sum();
    (units / policy.max_cost_units).clamp(0.0, 1.0)
}

fn confidence_score(
    report: &AnalysisReport,
    candidate: &StrategyCandidate,
    policy: &ScoringPolicy,
) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let data_volume =
        (report.segments.len() as f64 / (policy.min_segments.max(1) * 2) as f64).min(1.0);

    let severities: Vec<f64> = candidate
        .target_problem_ids
        .iter()
        .filter_map(|id| report.problems.get(*id))
        .map(|p| p.severity)
        .collect();
    let clarity = if severities.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let n = severities.len() as f64;
        severities.iter().sum::<f64>() / n
    };

    (0.5 * data_volume + 0.5 * clarity).clamp(0.0, 1.0)
}

/// Trust earned by the evidence behind a strategy. Weak evidence earns none.
fn trust_bonus(confidence: f64, policy: &ScoringPolicy) -> f64 {
    if confidence < policy.min_trust_confidence {
        0.0
    } else {
        confidence
    }
}

/// Score one candidate against the report it was generated from.
#[must_use]
pub fn score_candidate(
    report: &AnalysisReport,
    candidate: &StrategyCandidate,
    policy: &ScoringPolicy,
) -> ScoredStrategy {
    let impact = impact_score(report, candidate, policy);
    let risk = risk_score(report, candidate);
    let cost = cost_score(candidate, policy);
    let confidence = confidence_score(report, candidate, policy);

    let weights = &policy.weights;
    let breakdown = ScoreBreakdown {
        impact_contribution: weights.impact * impact,
        risk_penalty: weights.risk * risk,
        cost_penalty: weights.cost * cost,
        trust_bonus: weights.trust * trust_bonus(confidence, policy),
    };

    ScoredStrategy {
        strategy_id: candidate.id.clone(),
        framework: candidate.framework,
        hook_type: candidate.hook_type,
        actions: candidate.actions.clone(),
        target_problem_ids: candidate.target_problem_ids.clone(),
        impact_score: impact,
        risk_score: risk,
        cost_score: cost,
        confidence_score: confidence,
        final_score: breakdown.total(),
        breakdown,
    }
}

/// Score every candidate, preserving creation order.
#[must_use]
pub fn score_candidates(
    report: &AnalysisReport,
    candidates: &[StrategyCandidate],
    policy: &ScoringPolicy,
) -> Vec<ScoredStrategy> {
    candidates
        .iter()
        .map(|c| score_candidate(report, c, policy))
        .collect()
}

/// Order strategies best first.
///
/// Higher `final_score` wins; ties go to the lower `risk_score`, then to the
/// earlier-created candidate (the sort is stable).
#[must_use]
pub fn rank_strategies(mut scored: Vec<ScoredStrategy>) -> Vec<ScoredStrategy> {
    scored.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.risk_score.total_cmp(&b.risk_score))
    });
    scored
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
