//! Bounded, cancellable execution of a locked plan.
//!
//! Each variation is routed live, rendered on the first qualifying backend,
//! and retried down the qualifying chain when a render fails. Failures stay
//! local to their variation and degrade the plan to `partial_success`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use adforge_core::{
    AppConfig, CreativePlan, PlanStatus, RouterResult, RouterStatus, RoutingContext, StateError,
    Variation, VariationEvent, VariationState,
};
use adforge_planner::{lock_plan, LockedPlan};
use adforge_router::{route, RouteMode, RouteRequest, RoutingFailure};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendRegistry, RenderJob};

#[derive(Debug, Clone, Copy)]
pub struct SupervisorConfig {
    pub max_concurrent_variations: usize,
    pub variation_timeout: Duration,
    pub routing: RoutingContext,
}

impl SupervisorConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig, routing: RoutingContext) -> Self {
        Self {
            max_concurrent_variations: config.max_concurrent_variations,
            variation_timeout: Duration::from_secs(config.variation_timeout_secs),
            routing,
        }
    }
}

/// One failed render attempt on a backend in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderAttemptFailure {
    pub backend_id: String,
    pub error: String,
}

/// Why a variation produced no artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VariationFailure {
    Routing {
        index: usize,
        failure: RoutingFailure,
    },
    Timeout {
        index: usize,
        backend_id: String,
        timeout_ms: u64,
    },
    Render {
        index: usize,
        attempts: Vec<RenderAttemptFailure>,
    },
    Cancelled {
        index: usize,
    },
}

impl VariationFailure {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            VariationFailure::Routing { index, .. }
            | VariationFailure::Timeout { index, .. }
            | VariationFailure::Render { index, .. }
            | VariationFailure::Cancelled { index } => *index,
        }
    }
}

impl std::fmt::Display for VariationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariationFailure::Routing { failure, .. } => write!(f, "{failure}"),
            VariationFailure::Timeout {
                index,
                backend_id,
                timeout_ms,
            } => write!(
                f,
                "variation {index} timed out after {timeout_ms} ms on {backend_id}"
            ),
            VariationFailure::Render { index, attempts } => write!(
                f,
                "variation {index} failed on all {} qualifying backend(s)",
                attempts.len()
            ),
            VariationFailure::Cancelled { index } => {
                write!(f, "variation {index} cancelled before dispatch")
            }
        }
    }
}

/// A rendered variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub index: usize,
    pub backend_id: String,
    pub provider: String,
    pub video_url: String,
    /// Backends passed over before this one, at routing or at render time.
    pub fallback_depth: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariationOutcome {
    pub index: usize,
    pub state: VariationState,
    pub result: RouterResult,
    pub artifact: Option<Artifact>,
    pub failure: Option<VariationFailure>,
    /// Render failures on earlier backends, kept even when a later one succeeded.
    pub render_failures: Vec<RenderAttemptFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanExecutionResult {
    pub plan: Arc<CreativePlan>,
    pub status: RouterStatus,
    pub processing_time_ms: u64,
    pub outcomes: Vec<VariationOutcome>,
}

impl PlanExecutionResult {
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.outcomes.iter().filter_map(|o| o.artifact.as_ref())
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariationFailure> {
        self.outcomes.iter().filter_map(|o| o.failure.as_ref())
    }

    /// Plan-level result; `video_url` is the first artifact's.
    #[must_use]
    pub fn summary(&self) -> RouterResult {
        let rendered = self.artifacts().count();
        let total = self.outcomes.len();
        RouterResult {
            status: self.status,
            video_url: self.artifacts().next().map(|a| a.video_url.clone()),
            processing_time_ms: self.processing_time_ms,
            human_readable_message: format!(
                "plan {}: {rendered} of {total} variation(s) rendered",
                self.plan.id
            ),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Apply a variation event; an impossible move is logged and ends in `Error`.
fn advance(state: VariationState, event: VariationEvent, index: usize) -> VariationState {
    state.transition(event).unwrap_or_else(|err| {
        tracing::error!(variation = index, error = %err, "illegal variation transition");
        VariationState::Error
    })
}

/// Wait for a render slot; `None` once `cancel` fires first.
async fn acquire_slot(
    slots: &Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Option<OwnedSemaphorePermit> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        permit = Arc::clone(slots).acquire_owned() => permit.ok(),
    }
}

pub struct ExecutionSupervisor {
    config: SupervisorConfig,
    /// One permit per in-flight backend call. A permit moves into the
    /// spawned render and is released only when that call returns.
    render_slots: Arc<Semaphore>,
}

impl ExecutionSupervisor {
    #[must_use]
    pub fn new(config: SupervisorConfig) -> Self {
        let render_slots = Arc::new(Semaphore::new(config.max_concurrent_variations.max(1)));
        Self {
            config,
            render_slots,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Execute every variation of a locked plan.
    ///
    /// At most `max_concurrent_variations` backend calls are in flight at
    /// once, counting renders that outlived their variation's timeout. Once
    /// `cancel` fires, no new render is dispatched; renders already spawned
    /// run to completion and their variations are reported as they conclude.
    pub async fn execute(
        &self,
        plan: &LockedPlan,
        registry: &BackendRegistry,
        cancel: &CancellationToken,
    ) -> PlanExecutionResult {
        let started = Instant::now();
        let shared = plan.shared();
        let max_concurrent = self.config.max_concurrent_variations.max(1);

        tracing::info!(
            plan_id = %shared.id,
            variations = shared.variations.len(),
            backends = registry.len(),
            max_concurrent,
            "executing locked plan"
        );

        let mut outcomes: Vec<VariationOutcome> = stream::iter(shared.variations.iter())
            .map(|variation| self.run_variation(&shared, variation, registry, cancel))
            .buffer_unordered(max_concurrent)
            .collect()
            .await;
        outcomes.sort_by_key(|o| o.index);

        let failed = outcomes.iter().filter(|o| o.failure.is_some()).count();
        let status = if failed == 0 {
            RouterStatus::Completed
        } else {
            RouterStatus::PartialSuccess
        };
        if failed > 0 {
            tracing::warn!(
                plan_id = %shared.id,
                failed,
                total = outcomes.len(),
                "some variations failed during execution"
            );
        }

        let result = PlanExecutionResult {
            plan: Arc::clone(&shared),
            status,
            processing_time_ms: elapsed_ms(started),
            outcomes,
        };
        tracing::info!(
            plan_id = %shared.id,
            status = ?result.status,
            processing_time_ms = result.processing_time_ms,
            "plan execution finished"
        );
        result
    }

    #[allow(clippy::too_many_lines)]
    async fn run_variation(
        &self,
        plan: &CreativePlan,
        variation: &Variation,
        registry: &BackendRegistry,
        cancel: &CancellationToken,
    ) -> VariationOutcome {
        let started = Instant::now();
        let index = variation.index;
        let mut state = VariationState::Queued;

        if cancel.is_cancelled() {
            state = advance(state, VariationEvent::Fail, index);
            return failed_outcome(
                index,
                state,
                VariationFailure::Cancelled { index },
                vec![],
                started,
            );
        }

        let request = RouteRequest {
            variation_index: index,
            required_capabilities: variation.required_capabilities.clone(),
            use_vps: variation.use_vps,
        };
        let decision = match route(
            registry.descriptors(),
            &request,
            &self.config.routing,
            RouteMode::Live,
        ) {
            Ok(decision) => decision,
            Err(failure) => {
                state = advance(state, VariationEvent::Fail, index);
                return failed_outcome(
                    index,
                    state,
                    VariationFailure::Routing { index, failure },
                    vec![],
                    started,
                );
            }
        };

        // Queue time waiting for a slot does not count against the timeout.
        let Some(first_slot) = acquire_slot(&self.render_slots, cancel).await else {
            state = advance(state, VariationEvent::Fail, index);
            return failed_outcome(
                index,
                state,
                VariationFailure::Cancelled { index },
                vec![],
                started,
            );
        };
        let mut slot = Some(first_slot);

        state = advance(state, VariationEvent::Start, index);
        let deadline = tokio::time::Instant::now() + self.config.variation_timeout;
        let job = RenderJob::from_variation(plan, variation);
        let mut render_failures = Vec::new();

        for (position, backend) in decision.chain().enumerate() {
            if cancel.is_cancelled() {
                state = advance(state, VariationEvent::Fail, index);
                return failed_outcome(
                    index,
                    state,
                    VariationFailure::Cancelled { index },
                    render_failures,
                    started,
                );
            }
            let Some(adapter) = registry.adapter(&backend.id) else {
                render_failures.push(RenderAttemptFailure {
                    backend_id: backend.id.clone(),
                    error: "no adapter registered".to_owned(),
                });
                continue;
            };

            let permit = match slot.take() {
                Some(permit) => permit,
                None => match tokio::time::timeout_at(
                    deadline,
                    acquire_slot(&self.render_slots, cancel),
                )
                .await
                {
                    Ok(Some(permit)) => permit,
                    Ok(None) => {
                        state = advance(state, VariationEvent::Fail, index);
                        return failed_outcome(
                            index,
                            state,
                            VariationFailure::Cancelled { index },
                            render_failures,
                            started,
                        );
                    }
                    Err(_elapsed) => {
                        state = advance(state, VariationEvent::Fail, index);
                        return self.timed_out(index, state, &backend.id, render_failures, started);
                    }
                },
            };

            let job = job.clone();
            let handle = tokio::spawn(async move {
                let rendered = adapter.render(&job).await;
                drop(permit);
                rendered
            });
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(Ok(output))) => {
                    state = advance(state, VariationEvent::Complete, index);
                    let processing_time_ms = elapsed_ms(started);
                    let fallback_depth = decision.fallback_depth + position;
                    tracing::info!(
                        plan_id = %plan.id,
                        variation = index,
                        backend = %backend.id,
                        fallback_depth,
                        processing_time_ms,
                        "variation rendered"
                    );
                    return VariationOutcome {
                        index,
                        state,
                        result: RouterResult {
                            status: RouterStatus::Completed,
                            video_url: Some(output.video_url.clone()),
                            processing_time_ms,
                            human_readable_message: format!(
                                "variation {index} rendered by {} ({})",
                                backend.id, decision.reasoning
                            ),
                        },
                        artifact: Some(Artifact {
                            index,
                            backend_id: backend.id.clone(),
                            provider: backend.provider.clone(),
                            video_url: output.video_url,
                            fallback_depth,
                        }),
                        failure: None,
                        render_failures,
                    };
                }
                Ok(Ok(Err(err))) => {
                    tracing::warn!(
                        variation = index,
                        backend = %backend.id,
                        error = %err,
                        "render failed, trying next qualifying backend"
                    );
                    render_failures.push(RenderAttemptFailure {
                        backend_id: backend.id.clone(),
                        error: err.to_string(),
                    });
                }
                Ok(Err(join_err)) => {
                    tracing::error!(
                        variation = index,
                        backend = %backend.id,
                        error = %join_err,
                        "render task aborted"
                    );
                    render_failures.push(RenderAttemptFailure {
                        backend_id: backend.id.clone(),
                        error: join_err.to_string(),
                    });
                }
                Err(_elapsed) => {
                    // The render keeps running and holds its slot; its result is dropped.
                    state = advance(state, VariationEvent::Fail, index);
                    return self.timed_out(index, state, &backend.id, render_failures, started);
                }
            }
        }

        state = advance(state, VariationEvent::Fail, index);
        let attempts = render_failures.clone();
        failed_outcome(
            index,
            state,
            VariationFailure::Render { index, attempts },
            render_failures,
            started,
        )
    }

    fn timed_out(
        &self,
        index: usize,
        state: VariationState,
        backend_id: &str,
        render_failures: Vec<RenderAttemptFailure>,
        started: Instant,
    ) -> VariationOutcome {
        let timeout_ms =
            u64::try_from(self.config.variation_timeout.as_millis()).unwrap_or(u64::MAX);
        failed_outcome(
            index,
            state,
            VariationFailure::Timeout {
                index,
                backend_id: backend_id.to_owned(),
                timeout_ms,
            },
            render_failures,
            started,
        )
    }
}

fn failed_outcome(
    index: usize,
    state: VariationState,
    failure: VariationFailure,
    render_failures: Vec<RenderAttemptFailure>,
    started: Instant,
) -> VariationOutcome {
    tracing::warn!(variation = index, failure = %failure, "variation failed");
    VariationOutcome {
        index,
        state,
        result: RouterResult {
            status: RouterStatus::PartialSuccess,
            video_url: None,
            processing_time_ms: elapsed_ms(started),
            human_readable_message: failure.to_string(),
        },
        artifact: None,
        failure: Some(failure),
        render_failures,
    }
}

/// Lock a validated plan and execute it.
///
/// # Errors
///
/// Returns [`StateError::UnexpectedStatus`] unless the plan is `validated`.
pub async fn lock_and_execute(
    mut plan: CreativePlan,
    registry: &BackendRegistry,
    supervisor: &ExecutionSupervisor,
    cancel: CancellationToken,
) -> Result<PlanExecutionResult, StateError> {
    if plan.status != PlanStatus::Validated {
        return Err(StateError::UnexpectedStatus {
            plan_id: plan.id.to_string(),
            expected: PlanStatus::Validated,
            actual: plan.status,
        });
    }
    let locked = lock_plan(&mut plan)?;
    Ok(supervisor.execute(&locked, registry, &cancel).await)
}
