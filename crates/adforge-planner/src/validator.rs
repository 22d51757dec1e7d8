//! Structural checks on a compiled plan.
//!
//! Validation never mutates variations. Errors block the move to
//! `validated`; warnings are advisory.

use std::collections::HashSet;

use adforge_core::{
    BackendDescriptor, CreativePlan, PlanEvent, PlanStatus, RoutingContext, StateError,
    DURATION_MAX, DURATION_MIN, MAX_VARIATIONS,
};
use adforge_router::{route, RouteMode, RouteRequest};
use serde::Serialize;

/// Hook types in the catalogue; caps the hook coverage target.
const HOOK_COVERAGE_CAP: usize = 6;

/// Backends and caller context the plan is checked against.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    pub backends: &'a [BackendDescriptor],
    pub routing: RoutingContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

fn check_errors(plan: &CreativePlan, errors: &mut Vec<String>) {
    if plan.variations.is_empty() {
        errors.push("plan has no variations".to_string());
    }
    if plan.variations.len() > MAX_VARIATIONS {
        errors.push(format!(
            "plan has {} variations; at most {MAX_VARIATIONS} are allowed",
            plan.variations.len()
        ));
    }
    for variation in &plan.variations {
        if !variation.duration_in_bounds() {
            errors.push(format!(
                "variation {}: target_duration {} is outside [{DURATION_MIN}, {DURATION_MAX}] seconds",
                variation.index, variation.target_duration
            ));
        }
    }
    match &plan.audience {
        None => errors.push("audience is required".to_string()),
        Some(audience) => {
            if audience.language.trim().is_empty() {
                errors.push("audience language is blank".to_string());
            }
            if audience.country.trim().is_empty() {
                errors.push("audience country is blank".to_string());
            }
        }
    }
}

fn check_warnings(plan: &CreativePlan, ctx: &ValidationContext<'_>, warnings: &mut Vec<String>) {
    for variation in &plan.variations {
        let Some(planned) = variation.engine_id.as_deref() else {
            warnings.push(format!("variation {}: no engine assigned", variation.index));
            continue;
        };
        let request = RouteRequest {
            variation_index: variation.index,
            required_capabilities: variation.required_capabilities.clone(),
            use_vps: variation.use_vps,
        };
        match route(ctx.backends, &request, &ctx.routing, RouteMode::Live) {
            Ok(decision) if decision.backend.id != planned => warnings.push(format!(
                "variation {}: planned engine {planned} but live routing now picks {}",
                variation.index, decision.backend.id
            )),
            Ok(_) => {}
            Err(_) => warnings.push(format!(
                "variation {}: planned engine {planned} but no backend qualifies now",
                variation.index
            )),
        }
    }

    let count = plan.variations.len();
    let distinct_hooks: HashSet<_> = plan.variations.iter().map(|v| v.hook_type).collect();
    let target = count.min(HOOK_COVERAGE_CAP);
    // distinct < 50% of target, kept in integers
    if count > 0 && distinct_hooks.len() * 2 < target {
        warnings.push(format!(
            "low hook diversity: {} distinct hook type(s) across {count} variation(s)",
            distinct_hooks.len()
        ));
    }

    let mut seen = HashSet::new();
    for variation in &plan.variations {
        let triple = (variation.hook_type, variation.pacing, variation.transitions);
        if !seen.insert(triple) {
            warnings.push(format!(
                "variation {}: duplicate ({}, {}, {}) combination",
                variation.index, triple.0, triple.1, triple.2
            ));
        }
    }
}

/// Check a plan against the hard invariants and advisory heuristics.
#[must_use]
pub fn validate_plan(plan: &CreativePlan, ctx: &ValidationContext<'_>) -> ValidationReport {
    let mut report = ValidationReport::default();
    check_errors(plan, &mut report.errors);
    check_warnings(plan, ctx, &mut report.warnings);
    report
}

/// Validate `plan` and advance it to `validated` when it has no errors.
///
/// A plan with errors keeps its status. Re-validating a validated plan
/// leaves it validated. Variations are never touched.
///
/// # Errors
///
/// Returns [`StateError::InvalidTransition`] for a locked plan.
pub fn validate_and_advance(
    plan: &mut CreativePlan,
    ctx: &ValidationContext<'_>,
) -> Result<ValidationReport, StateError> {
    if plan.status == PlanStatus::Locked {
        return Err(StateError::InvalidTransition {
            from: plan.status,
            event: PlanEvent::Validate,
        });
    }

    let report = validate_plan(plan, ctx);
    if report.is_valid() {
        plan.status = plan.status.transition(PlanEvent::Validate)?;
    }

    tracing::info!(
        plan_id = %plan.id,
        status = %plan.status,
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated creative plan"
    );
    for error in &report.errors {
        tracing::warn!(plan_id = %plan.id, error = %error, "plan validation error");
    }
    Ok(report)
}
