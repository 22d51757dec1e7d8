//! Candidate generation: detected problems × frameworks → strategy candidates.

use std::collections::{BTreeSet, HashSet};

use adforge_core::{
    ActionKind, AnalysisReport, Framework, ProblemId, ProblemType, ScoringPolicy, SegmentType,
    StrategyAction, StrategyCandidate,
};

/// Actions that fix each problem type, strongest first.
pub(crate) fn playbook(problem_type: ProblemType) -> &'static [StrategyAction] {
    use ActionKind as A;
    use SegmentType as S;

    const WEAK_HOOK: &[StrategyAction] = &[
        StrategyAction::new(A::ReplaceHook, S::Hook),
        StrategyAction::new(A::AddTextOverlay, S::Hook),
    ];
    const LOW_ATTENTION: &[StrategyAction] = &[
        StrategyAction::new(A::TrimSegment, S::Body),
        StrategyAction::new(A::SpeedUp, S::Body),
    ];
    const POOR_CLARITY: &[StrategyAction] = &[
        StrategyAction::new(A::AddCaptions, S::Body),
        StrategyAction::new(A::AddTextOverlay, S::Body),
    ];
    const WEAK_CTA: &[StrategyAction] = &[
        StrategyAction::new(A::StrengthenCta, S::Cta),
        StrategyAction::new(A::AddTextOverlay, S::Cta),
    ];
    const SLOW_PACING: &[StrategyAction] = &[
        StrategyAction::new(A::SpeedUp, S::Body),
        StrategyAction::new(A::TrimSegment, S::Body),
    ];
    const LOW_RETENTION: &[StrategyAction] = &[
        StrategyAction::new(A::ReorderSegments, S::Body),
        StrategyAction::new(A::TrimSegment, S::Proof),
    ];

    match problem_type {
        ProblemType::WeakHook => WEAK_HOOK,
        ProblemType::LowAttention => LOW_ATTENTION,
        ProblemType::PoorClarity => POOR_CLARITY,
        ProblemType::WeakCta => WEAK_CTA,
        ProblemType::SlowPacing => SLOW_PACING,
        ProblemType::LowRetention => LOW_RETENTION,
    }
}

/// Edits a framework always makes to impose its structure.
pub(crate) fn structural_actions(framework: Framework) -> &'static [StrategyAction] {
    use ActionKind as A;
    use SegmentType as S;

    const AIDA: &[StrategyAction] = &[StrategyAction::new(A::AddTextOverlay, S::Cta)];
    const PAS: &[StrategyAction] = &[StrategyAction::new(A::ReorderSegments, S::Hook)];
    const BEFORE_AFTER: &[StrategyAction] = &[StrategyAction::new(A::ReorderSegments, S::Proof)];
    const SOCIAL_PROOF: &[StrategyAction] = &[StrategyAction::new(A::AddSocialProof, S::Proof)];

    match framework {
        Framework::ProblemSolution => &[],
        Framework::Aida => AIDA,
        Framework::Pas => PAS,
        Framework::BeforeAfter => BEFORE_AFTER,
        Framework::SocialProof => SOCIAL_PROOF,
    }
}

/// Produce strategy candidates for the most severe problems in `report`.
///
/// Problems below `policy.severity_floor` are ignored; if none remain the
/// result is empty. Problem sets are visited most severe first (each focus
/// problem alone, then all focus problems together) and every framework is
/// tried against each set. Candidates that target the same problems with the
/// same action list are dropped, the first one produced wins.
#[must_use]
pub fn generate_candidates(
    report: &AnalysisReport,
    policy: &ScoringPolicy,
) -> Vec<StrategyCandidate> {
    let focus: Vec<(ProblemId, ProblemType)> = report
        .problems_above(policy.severity_floor)
        .into_iter()
        .take(policy.max_focus_problems)
        .map(|(id, p)| (id, p.problem_type))
        .collect();

    if focus.is_empty() {
        return Vec::new();
    }

    let mut problem_sets: Vec<Vec<(ProblemId, ProblemType)>> =
        focus.iter().map(|entry| vec![*entry]).collect();
    if focus.len() > 1 {
        problem_sets.push(focus.clone());
    }

    let mut seen: HashSet<(BTreeSet<ProblemId>, Vec<StrategyAction>)> = HashSet::new();
    let mut candidates = Vec::new();

    'sets: for set in &problem_sets {
        let target_problem_ids: BTreeSet<ProblemId> = set.iter().map(|(id, _)| *id).collect();

        for framework in Framework::ALL {
            if candidates.len() >= policy.max_candidates {
                break 'sets;
            }

            let mut actions: Vec<StrategyAction> = Vec::new();
            let set_actions = set
                .iter()
                .flat_map(|(_, problem_type)| playbook(*problem_type).iter());
            for action in set_actions.chain(structural_actions(framework)) {
                if !actions.contains(action) {
                    actions.push(*action);
                }
            }

            if !seen.insert((target_problem_ids.clone(), actions.clone())) {
                tracing::debug!(
                    framework = %framework,
                    problems = ?target_problem_ids,
                    "dropping duplicate candidate"
                );
                continue;
            }

            candidates.push(StrategyCandidate {
                id: format!("cand-{:02}", candidates.len() + 1),
                framework,
                hook_type: framework.preferred_hook(),
                actions,
                target_problem_ids: target_problem_ids.clone(),
            });
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use adforge_core::{DetectedProblem, HookType};

    use super::*;

    fn report_with(problems: &[(ProblemType, f64)]) -> AnalysisReport {
        AnalysisReport {
            source_duration_secs: 30.0,
            segments: vec![],
            problems: problems
                .iter()
                .map(|(problem_type, severity)| DetectedProblem {
                    problem_type: *problem_type,
                    severity: *severity,
                    details: String::new(),
                    segment_id: None,
                })
                .collect(),
        }
    }

    #[test]
    fn no_candidates_below_severity_floor() {
        let report = report_with(&[(ProblemType::WeakHook, 0.1), (ProblemType::WeakCta, 0.29)]);
        assert!(generate_candidates(&report, &ScoringPolicy::default()).is_empty());
    }

    #[test]
    fn single_problem_yields_one_candidate_per_framework() {
        let report = report_with(&[(ProblemType::WeakHook, 0.9)]);
        let candidates = generate_candidates(&report, &ScoringPolicy::default());
        assert_eq!(candidates.len(), Framework::ALL.len());
        assert!(candidates
            .iter()
            .all(|c| c.target_problem_ids == BTreeSet::from([0])));
        assert_eq!(candidates[0].id, "cand-01");
        assert_eq!(candidates[0].framework, Framework::ProblemSolution);
        assert_eq!(candidates[0].hook_type, HookType::PainPoint);
    }

    #[test]
    fn identical_problem_set_and_actions_are_deduplicated() {
        // Aida's structural overlay on the CTA is already in the weak-CTA
        // playbook, so it collapses into the problem-solution candidate.
        let report = report_with(&[(ProblemType::WeakCta, 0.8)]);
        let candidates = generate_candidates(&report, &ScoringPolicy::default());
        assert_eq!(candidates.len(), Framework::ALL.len() - 1);
        assert!(candidates.iter().all(|c| c.framework != Framework::Aida));
    }

    #[test]
    fn most_severe_problem_is_targeted_first() {
        let report = report_with(&[(ProblemType::WeakCta, 0.5), (ProblemType::WeakHook, 0.9)]);
        let candidates = generate_candidates(&report, &ScoringPolicy::default());
        assert_eq!(candidates[0].target_problem_ids, BTreeSet::from([1]));
        let last = candidates.last().unwrap();
        assert_eq!(last.target_problem_ids, BTreeSet::from([0, 1]));
    }

    #[test]
    fn candidate_count_respects_cap() {
        let report = report_with(&[
            (ProblemType::WeakHook, 0.9),
            (ProblemType::WeakCta, 0.8),
            (ProblemType::PoorClarity, 0.7),
        ]);
        let policy = ScoringPolicy {
            max_candidates: 4,
            ..ScoringPolicy::default()
        };
        let candidates = generate_candidates(&report, &policy);
        assert_eq!(candidates.len(), 4);
        assert_eq!(candidates[3].id, "cand-04");
    }

    #[test]
    fn actions_are_unique_within_a_candidate() {
        let report = report_with(&[
            (ProblemType::LowAttention, 0.9),
            (ProblemType::SlowPacing, 0.8),
        ]);
        for candidate in generate_candidates(&report, &ScoringPolicy::default()) {
            let unique: HashSet<_> = candidate.actions.iter().collect();
            assert_eq!(unique.len(), candidate.actions.len(), "{candidate:?}");
        }
    }
}
