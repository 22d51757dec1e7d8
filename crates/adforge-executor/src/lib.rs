//! Plan execution: render adapters, live routing with runtime fallback, and
//! the bounded supervisor that drives a locked plan to completion.

pub mod backend;
pub mod error;
pub mod http;
mod retry;
pub mod supervisor;

pub use backend::{BackendRegistry, RenderBackend, RenderJob, RenderOutput};
pub use error::RenderError;
pub use http::{build_http_registry, HttpRenderBackend, HttpRenderConfig};
pub use supervisor::{
    lock_and_execute, Artifact, ExecutionSupervisor, PlanExecutionResult, RenderAttemptFailure,
    SupervisorConfig, VariationFailure, VariationOutcome,
};
