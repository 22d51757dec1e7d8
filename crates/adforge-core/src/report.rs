//! Analysis report consumed from the external content analyzer.
//!
//! The engine never inspects pixels or audio; it only reads the per-segment
//! scores and detected problems the analyzer produced.

use serde::{Deserialize, Serialize};

/// Severity at or above which a problem counts as "high".
pub const HIGH_SEVERITY: f64 = 0.7;

/// Mean segment score at or above which a segment counts as healthy.
pub const HEALTHY_SEGMENT_THRESHOLD: f64 = 0.6;

/// Index of a problem within [`AnalysisReport::problems`].
pub type ProblemId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    WeakHook,
    LowAttention,
    PoorClarity,
    WeakCta,
    SlowPacing,
    LowRetention,
}

impl ProblemType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemType::WeakHook => "weak_hook",
            ProblemType::LowAttention => "low_attention",
            ProblemType::PoorClarity => "poor_clarity",
            ProblemType::WeakCta => "weak_cta",
            ProblemType::SlowPacing => "slow_pacing",
            ProblemType::LowRetention => "low_retention",
        }
    }
}

impl std::fmt::Display for ProblemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedProblem {
    pub problem_type: ProblemType,
    /// Normalized severity in `[0, 1]`. Not a probability.
    pub severity: f64,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub segment_id: Option<String>,
}

impl DetectedProblem {
    #[must_use]
    pub fn is_high(&self) -> bool {
        self.severity >= HIGH_SEVERITY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Hook,
    Body,
    Proof,
    Cta,
}

impl std::fmt::Display for SegmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentType::Hook => write!(f, "hook"),
            SegmentType::Body => write!(f, "body"),
            SegmentType::Proof => write!(f, "proof"),
            SegmentType::Cta => write!(f, "cta"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    pub segment_type: SegmentType,
    pub start_secs: f64,
    pub end_secs: f64,
    pub attention: f64,
    pub hook_strength: f64,
    pub clarity: f64,
    pub cta_effectiveness: f64,
}

impl Segment {
    /// Mean of the four analyzer scores, clamped to `[0, 1]`.
    #[must_use]
    pub fn health(&self) -> f64 {
        let mean = (self.attention + self.hook_strength + self.clarity + self.cta_effectiveness) / 4.0;
        if mean.is_finite() {
            mean.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.health() >= HEALTHY_SEGMENT_THRESHOLD
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub source_duration_secs: f64,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub problems: Vec<DetectedProblem>,
}

impl AnalysisReport {
    /// Fraction of segments of `segment_type` that are currently healthy.
    ///
    /// Returns `0.0` when the report has no segment of that type: there is
    /// nothing healthy to degrade.
    #[must_use]
    pub fn healthy_fraction(&self, segment_type: SegmentType) -> f64 {
        let matching: Vec<&Segment> = self
            .segments
            .iter()
            .filter(|s| s.segment_type == segment_type)
            .collect();
        if matching.is_empty() {
            return 0.0;
        }
        let healthy = matching.iter().filter(|s| s.is_healthy()).count();
        #[allow(clippy::cast_precision_loss)]
        let ratio = healthy as f64 / matching.len() as f64;
        ratio
    }

    /// Problems whose severity reaches `floor`, ordered by severity
    /// descending. Ties keep report order.
    #[must_use]
    pub fn problems_above(&self, floor: f64) -> Vec<(ProblemId, &DetectedProblem)> {
        let mut eligible: Vec<(ProblemId, &DetectedProblem)> = self
            .problems
            .iter()
            .enumerate()
            .filter(|(_, p)| p.severity.is_finite() && p.severity >= floor)
            .collect();
        eligible.sort_by(|a, b| b.1.severity.total_cmp(&a.1.severity));
        eligible
    }
}
