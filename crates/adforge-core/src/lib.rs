//! Shared domain types and configuration for the adforge creative engine.
//!
//! Everything downstream crates exchange lives here: the analysis report the
//! engine consumes, strategy and scoring records, the creative plan and its
//! variations, backend descriptors, and the policy/config loaders.

pub mod app_config;
pub mod backend;
pub mod config;
pub mod error;
pub mod plan;
pub mod policy;
pub mod report;
pub mod strategy;

pub use app_config::{AppConfig, Environment};
pub use backend::{
    load_backends, parse_backends, BackendClass, BackendDescriptor, BackendsFile, Capability,
    RenderingMode, RoutingContext, UserTier,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, StateError};
pub use plan::{
    AspectRatio, Audience, CostEstimate, CreativePlan, ExecutionStrategy, GlobalSettings, Pacing,
    PlanEvent, PlanStatus, Platform, RouterResult, RouterStatus, Transition, Variation,
    VariationEvent, VariationReasoning, VariationState, DURATION_MAX, DURATION_MIN,
    MAX_VARIATIONS,
};
pub use policy::{load_policy, parse_policy, ScoreWeights, ScoringPolicy};
pub use report::{
    AnalysisReport, DetectedProblem, ProblemId, ProblemType, Segment, SegmentType,
    HEALTHY_SEGMENT_THRESHOLD, HIGH_SEVERITY,
};
pub use strategy::{
    ActionKind, BrainFailureOutput, ConfidenceLevel, Decision, Explanation, FailureMode,
    FallbackSuggestion, Framework, HookType, ScoreBreakdown, ScoredStrategy, SelectionResult,
    StrategyAction, StrategyCandidate,
};
