//! `run` command handler.

use std::path::Path;

use adforge_core::{load_backends, AppConfig, CreativePlan, PlanStatus, RoutingContext};
use adforge_executor::{
    build_http_registry, lock_and_execute, ExecutionSupervisor, HttpRenderConfig,
    SupervisorConfig,
};
use adforge_planner::{validate_and_advance, LockedPlan, ValidationContext};
use anyhow::Context;
use tokio_util::sync::CancellationToken;

/// Cancel `token` on Ctrl-C so no further renders are dispatched.
fn cancel_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("received ctrl-c, stopping new render dispatch");
            token.cancel();
        }
    });
}

/// Execute a saved plan.
///
/// A locked plan is re-hydrated and its fingerprint checked. Any other plan
/// is re-validated against the current backends, then locked and executed.
///
/// # Errors
///
/// Returns an error if files cannot be loaded, the plan fails validation or
/// fingerprint checks, or a backend adapter cannot be built.
pub(crate) async fn run_plan_file(
    config: &AppConfig,
    plan_path: &Path,
    routing: RoutingContext,
) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(plan_path)
        .with_context(|| format!("failed to read plan {}", plan_path.display()))?;
    let mut plan: CreativePlan = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse plan {}", plan_path.display()))?;

    let backends = load_backends(&config.backends_path)?.backends;
    let registry = build_http_registry(&backends, &HttpRenderConfig::from_app_config(config))?;
    let supervisor = ExecutionSupervisor::new(SupervisorConfig::from_app_config(config, routing));

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let result = if plan.status == PlanStatus::Locked {
        let locked = LockedPlan::from_persisted(plan)?;
        supervisor.execute(&locked, &registry, &cancel).await
    } else {
        let ctx = ValidationContext {
            backends: registry.descriptors(),
            routing,
        };
        let report = validate_and_advance(&mut plan, &ctx)?;
        if !report.is_valid() {
            anyhow::bail!(
                "plan {} failed validation: {}",
                plan.id,
                report.errors.join("; ")
            );
        }
        lock_and_execute(plan, &registry, &supervisor, cancel).await?
    };

    let output = serde_json::json!({
        "summary": result.summary(),
        "execution": result,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
