//! Creative plan, its variations, and their state machines.
//!
//! A plan moves `generating -> validated -> locked` and never backward. Once
//! locked its variations are the exact ones executed; any change requires a
//! brand-new plan id.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::Capability;
use crate::error::StateError;
use crate::strategy::{Framework, HookType};

/// Shortest allowed variation, in seconds.
pub const DURATION_MIN: f64 = 6.0;
/// Longest allowed variation, in seconds.
pub const DURATION_MAX: f64 = 60.0;
/// Upper bound on variations in one plan.
pub const MAX_VARIATIONS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Generating,
    Validated,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanEvent {
    Validate,
    Lock,
}

impl PlanStatus {
    /// Pure transition function for the plan lifecycle.
    ///
    /// Re-validating a validated plan and re-locking a locked plan are
    /// no-ops. Every other combination not listed is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidTransition`] for backward or skipped
    /// transitions (e.g. locking a plan that is still generating).
    pub fn transition(self, event: PlanEvent) -> Result<PlanStatus, StateError> {
        match (self, event) {
            (PlanStatus::Generating | PlanStatus::Validated, PlanEvent::Validate) => {
                Ok(PlanStatus::Validated)
            }
            (PlanStatus::Validated | PlanStatus::Locked, PlanEvent::Lock) => Ok(PlanStatus::Locked),
            (from, event) => Err(StateError::InvalidTransition { from, event }),
        }
    }
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanStatus::Generating => write!(f, "generating"),
            PlanStatus::Validated => write!(f, "validated"),
            PlanStatus::Locked => write!(f, "locked"),
        }
    }
}

impl std::fmt::Display for PlanEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanEvent::Validate => write!(f, "validate"),
            PlanEvent::Lock => write!(f, "lock"),
        }
    }
}

/// Execution state of a single variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationState {
    Queued,
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationEvent {
    Start,
    Complete,
    Fail,
}

impl VariationState {
    /// Pure transition function for variation execution.
    ///
    /// A queued variation may fail without running (cancelled or unroutable).
    ///
    /// # Errors
    ///
    /// Returns [`StateError::InvalidVariationTransition`] for any other move,
    /// including leaving a terminal state.
    pub fn transition(self, event: VariationEvent) -> Result<VariationState, StateError> {
        match (self, event) {
            (VariationState::Queued, VariationEvent::Start) => Ok(VariationState::Running),
            (VariationState::Running, VariationEvent::Complete) => Ok(VariationState::Done),
            (VariationState::Queued | VariationState::Running, VariationEvent::Fail) => {
                Ok(VariationState::Error)
            }
            (state, event) => Err(StateError::InvalidVariationTransition(format!(
                "{state:?} + {event:?}"
            ))),
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, VariationState::Done | VariationState::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    Fast,
    Medium,
    Slow,
}

impl Pacing {
    pub const ALL: [Pacing; 3] = [Pacing::Fast, Pacing::Medium, Pacing::Slow];

    /// Multiplier applied to the source duration hint.
    #[must_use]
    pub fn duration_factor(self) -> f64 {
        match self {
            Pacing::Fast => 0.75,
            Pacing::Medium => 1.0,
            Pacing::Slow => 1.2,
        }
    }
}

impl std::fmt::Display for Pacing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pacing::Fast => write!(f, "fast"),
            Pacing::Medium => write!(f, "medium"),
            Pacing::Slow => write!(f, "slow"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    Cut,
    Fade,
    Zoom,
    Whip,
}

impl Transition {
    pub const ALL: [Transition; 4] = [
        Transition::Cut,
        Transition::Fade,
        Transition::Zoom,
        Transition::Whip,
    ];
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transition::Cut => write!(f, "cut"),
            Transition::Fade => write!(f, "fade"),
            Transition::Zoom => write!(f, "zoom"),
            Transition::Whip => write!(f, "whip"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "16:9")]
    Landscape,
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "9:16" => Ok(AspectRatio::Vertical),
            "1:1" => Ok(AspectRatio::Square),
            "4:5" => Ok(AspectRatio::Portrait),
            "16:9" => Ok(AspectRatio::Landscape),
            other => Err(format!("unknown aspect ratio '{other}'")),
        }
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AspectRatio::Vertical => write!(f, "9:16"),
            AspectRatio::Square => write!(f, "1:1"),
            AspectRatio::Portrait => write!(f, "4:5"),
            AspectRatio::Landscape => write!(f, "16:9"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Reels,
    Shorts,
    Feed,
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "reels" | "instagram" => Ok(Platform::Reels),
            "shorts" | "youtube" => Ok(Platform::Shorts),
            "feed" | "facebook" => Ok(Platform::Feed),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub language: String,
    pub country: String,
    pub market: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub aspect_ratio: AspectRatio,
    pub platform: Platform,
    pub source_duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationReasoning {
    pub framework: String,
    pub engine: String,
}

/// One concrete render job within a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variation {
    pub index: usize,
    pub framework: Framework,
    pub hook_type: HookType,
    pub pacing: Pacing,
    pub transitions: Transition,
    pub target_duration: f64,
    pub required_capabilities: BTreeSet<Capability>,
    pub engine_id: Option<String>,
    pub engine_provider: Option<String>,
    pub use_vps: bool,
    pub estimated_cost: f64,
    pub reasoning: VariationReasoning,
}

impl Variation {
    #[must_use]
    pub fn duration_in_bounds(&self) -> bool {
        self.target_duration.is_finite()
            && (DURATION_MIN..=DURATION_MAX).contains(&self.target_duration)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub optimized: f64,
    pub per_variation_average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativePlan {
    pub id: Uuid,
    pub status: PlanStatus,
    pub seed: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    /// SHA-256 over the serialized variations, set at lock time.
    #[serde(default)]
    pub fingerprint: Option<String>,
    pub strategy_id: String,
    pub framework: Framework,
    #[serde(default)]
    pub audience: Option<Audience>,
    pub global_settings: GlobalSettings,
    pub variations: Vec<Variation>,
    pub execution_strategy: ExecutionStrategy,
    pub cost_estimate: CostEstimate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouterStatus {
    Completed,
    PartialSuccess,
}

/// Terminal outcome of one routed variation, or of a whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterResult {
    pub status: RouterStatus,
    pub video_url: Option<String>,
    pub processing_time_ms: u64,
    pub human_readable_message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_moves_forward_only() {
        assert_eq!(
            PlanStatus::Generating.transition(PlanEvent::Validate),
            Ok(PlanStatus::Validated)
        );
        assert_eq!(
            PlanStatus::Validated.transition(PlanEvent::Lock),
            Ok(PlanStatus::Locked)
        );
        assert!(matches!(
            PlanStatus::Locked.transition(PlanEvent::Validate),
            Err(StateError::InvalidTransition {
                from: PlanStatus::Locked,
                event: PlanEvent::Validate
            })
        ));
    }

    #[test]
    fn plan_cannot_skip_validation() {
        assert!(PlanStatus::Generating.transition(PlanEvent::Lock).is_err());
    }

    #[test]
    fn repeated_validate_and_lock_are_no_ops() {
        assert_eq!(
            PlanStatus::Validated.transition(PlanEvent::Validate),
            Ok(PlanStatus::Validated)
        );
        assert_eq!(PlanStatus::Locked.transition(PlanEvent::Lock), Ok(PlanStatus::Locked));
    }

    #[test]
    fn variation_lifecycle() {
        let running = VariationState::Queued.transition(VariationEvent::Start).unwrap();
        assert_eq!(running, VariationState::Running);
        assert_eq!(
            running.transition(VariationEvent::Complete),
            Ok(VariationState::Done)
        );
        assert_eq!(
            VariationState::Queued.transition(VariationEvent::Fail),
            Ok(VariationState::Error)
        );
        assert!(VariationState::Done.transition(VariationEvent::Start).is_err());
        assert!(VariationState::Error.is_terminal());
    }

    #[test]
    fn aspect_ratio_round_trips_through_str() {
        for ratio in ["9:16", "1:1", "4:5", "16:9"] {
            let parsed: AspectRatio = ratio.parse().unwrap();
            assert_eq!(parsed.to_string(), ratio);
        }
        assert!("3:2".parse::<AspectRatio>().is_err());
    }

    #[test]
    fn platform_accepts_aliases() {
        assert_eq!("YouTube".parse::<Platform>().unwrap(), Platform::Shorts);
        assert_eq!("instagram".parse::<Platform>().unwrap(), Platform::Reels);
    }
}
