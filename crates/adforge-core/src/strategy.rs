//! Strategy candidates, scores, and the outcome of a decision pass.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::backend::Capability;
use crate::plan::Pacing;
use crate::report::{ProblemId, SegmentType};

/// A named creative structure a strategy follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    ProblemSolution,
    Aida,
    Pas,
    BeforeAfter,
    SocialProof,
}

impl Framework {
    pub const ALL: [Framework; 5] = [
        Framework::ProblemSolution,
        Framework::Aida,
        Framework::Pas,
        Framework::BeforeAfter,
        Framework::SocialProof,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Framework::ProblemSolution => "problem_solution",
            Framework::Aida => "aida",
            Framework::Pas => "pas",
            Framework::BeforeAfter => "before_after",
            Framework::SocialProof => "social_proof",
        }
    }

    #[must_use]
    pub fn preferred_hook(self) -> HookType {
        match self {
            Framework::ProblemSolution | Framework::Pas => HookType::PainPoint,
            Framework::Aida => HookType::Curiosity,
            Framework::BeforeAfter => HookType::Demonstration,
            Framework::SocialProof => HookType::Statistic,
        }
    }

    #[must_use]
    pub fn default_pacing(self) -> Pacing {
        match self {
            Framework::Pas | Framework::Aida => Pacing::Fast,
            Framework::ProblemSolution | Framework::SocialProof => Pacing::Medium,
            Framework::BeforeAfter => Pacing::Slow,
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    Question,
    BoldClaim,
    Statistic,
    PainPoint,
    Curiosity,
    Demonstration,
}

impl HookType {
    pub const ALL: [HookType; 6] = [
        HookType::Question,
        HookType::BoldClaim,
        HookType::Statistic,
        HookType::PainPoint,
        HookType::Curiosity,
        HookType::Demonstration,
    ];
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HookType::Question => "question",
            HookType::BoldClaim => "bold_claim",
            HookType::Statistic => "statistic",
            HookType::PainPoint => "pain_point",
            HookType::Curiosity => "curiosity",
            HookType::Demonstration => "demonstration",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    ReplaceHook,
    TrimSegment,
    ReorderSegments,
    AddTextOverlay,
    AddCaptions,
    StrengthenCta,
    SpeedUp,
    AddSocialProof,
}

impl ActionKind {
    /// Rendering capabilities a backend must advertise to carry out this action.
    #[must_use]
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            ActionKind::ReplaceHook | ActionKind::ReorderSegments => {
                &[Capability::Trim, Capability::Merge]
            }
            ActionKind::TrimSegment => &[Capability::Trim],
            ActionKind::AddTextOverlay | ActionKind::AddCaptions => &[Capability::TextOverlay],
            ActionKind::StrengthenCta | ActionKind::AddSocialProof => {
                &[Capability::Merge, Capability::TextOverlay]
            }
            ActionKind::SpeedUp => &[Capability::SpeedRamp],
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::ReplaceHook => "replace_hook",
            ActionKind::TrimSegment => "trim_segment",
            ActionKind::ReorderSegments => "reorder_segments",
            ActionKind::AddTextOverlay => "add_text_overlay",
            ActionKind::AddCaptions => "add_captions",
            ActionKind::StrengthenCta => "strengthen_cta",
            ActionKind::SpeedUp => "speed_up",
            ActionKind::AddSocialProof => "add_social_proof",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StrategyAction {
    pub action: ActionKind,
    pub target_segment_type: SegmentType,
}

impl StrategyAction {
    #[must_use]
    pub const fn new(action: ActionKind, target_segment_type: SegmentType) -> Self {
        Self {
            action,
            target_segment_type,
        }
    }
}

/// A not-yet-scored proposed creative strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyCandidate {
    pub id: String,
    pub framework: Framework,
    pub hook_type: HookType,
    pub actions: Vec<StrategyAction>,
    pub target_problem_ids: BTreeSet<ProblemId>,
}

/// Signed contributions of each sub-score to `final_score`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub impact_contribution: f64,
    pub risk_penalty: f64,
    pub cost_penalty: f64,
    pub trust_bonus: f64,
}

impl ScoreBreakdown {
    /// Reconstruct the final score from the stored contributions.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.impact_contribution - self.risk_penalty - self.cost_penalty + self.trust_bonus
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredStrategy {
    pub strategy_id: String,
    pub framework: Framework,
    pub hook_type: HookType,
    pub actions: Vec<StrategyAction>,
    pub target_problem_ids: BTreeSet<ProblemId>,
    pub impact_score: f64,
    pub risk_score: f64,
    pub cost_score: f64,
    pub confidence_score: f64,
    pub final_score: f64,
    pub breakdown: ScoreBreakdown,
}

impl ScoredStrategy {
    /// `1 - risk_score`, the display form of risk.
    #[must_use]
    pub fn safety(&self) -> f64 {
        1.0 - self.risk_score
    }

    /// `1 - cost_score`, the display form of cost.
    #[must_use]
    pub fn affordability(&self) -> f64 {
        1.0 - self.cost_score
    }

    /// Union of the capabilities every action of this strategy needs.
    #[must_use]
    pub fn required_capabilities(&self) -> BTreeSet<Capability> {
        self.actions
            .iter()
            .flat_map(|a| a.action.capabilities().iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    #[must_use]
    pub fn from_score(confidence: f64) -> Self {
        if confidence >= 0.7 {
            ConfidenceLevel::High
        } else if confidence >= 0.4 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub why_this_strategy: String,
    pub why_not_others: Vec<String>,
    pub confidence_level: ConfidenceLevel,
    pub expected_outcome: String,
}

/// The winning, explained strategy of one decision pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub strategy: ScoredStrategy,
    pub runners_up: Vec<ScoredStrategy>,
    pub explanation: Explanation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureMode {
    NoAction,
    SafeOptimizationOnly,
    NeedsMoreData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackSuggestion {
    pub strategy_id: String,
    pub framework: Framework,
    pub risk_score: f64,
    pub final_score: f64,
    pub summary: String,
}

/// Produced instead of a [`SelectionResult`] when no candidate clears policy.
///
/// Terminal for the analysis pass: the caller re-enters with different inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrainFailureOutput {
    pub mode: FailureMode,
    pub reason: String,
    pub fallback_suggestion: Option<FallbackSuggestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Decision {
    Selected(SelectionResult),
    Failed(BrainFailureOutput),
}

impl Decision {
    #[must_use]
    pub fn selection(&self) -> Option<&SelectionResult> {
        match self {
            Decision::Selected(s) => Some(s),
            Decision::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn failure(&self) -> Option<&BrainFailureOutput> {
        match self {
            Decision::Selected(_) => None,
            Decision::Failed(f) => Some(f),
        }
    }
}
