//! Turn a selected strategy into a bounded list of render variations.

use std::collections::BTreeSet;

use adforge_core::{
    AspectRatio, Audience, BackendDescriptor, Capability, CostEstimate, CreativePlan,
    ExecutionStrategy, GlobalSettings, HookType, Pacing, PlanStatus, Platform, RoutingContext,
    SelectionResult, Transition, Variation, VariationReasoning, DURATION_MAX, DURATION_MIN,
};
use adforge_router::{route, RouteMode, RouteRequest};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use uuid::Uuid;

use crate::validator::{validate_and_advance, ValidationContext};

/// Cost rate used for variations no backend can take at plan time.
pub const UNASSIGNED_COST_PER_SECOND: f64 = 0.05;

/// Base duration when the source duration is unknown or invalid.
const FALLBACK_BASE_DURATION: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct PlanGeneratorInput {
    pub variation_count: usize,
    pub platform: Platform,
    pub aspect_ratio: AspectRatio,
    /// `None` when the source ratio is unknown; resize is then always required.
    pub source_aspect_ratio: Option<AspectRatio>,
    pub source_duration_secs: f64,
    pub vps_available: bool,
    pub available_engines: Vec<BackendDescriptor>,
    pub audience: Option<Audience>,
    pub routing: RoutingContext,
    pub seed: u64,
}

/// Compiled plan together with its validation findings.
#[derive(Debug, Clone, Serialize)]
pub struct CompileOutcome {
    pub plan: CreativePlan,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl CompileOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Every `(hook, pacing)` pair, winner first, the rest in seeded order.
fn hook_pacing_pairs(first: (HookType, Pacing), seed: u64) -> Vec<(HookType, Pacing)> {
    let mut rest: Vec<(HookType, Pacing)> = HookType::ALL
        .iter()
        .flat_map(|&hook| Pacing::ALL.iter().map(move |&pacing| (hook, pacing)))
        .filter(|&pair| pair != first)
        .collect();
    let mut rng = StdRng::seed_from_u64(seed);
    rest.shuffle(&mut rng);

    let mut pairs = Vec::with_capacity(rest.len() + 1);
    pairs.push(first);
    pairs.extend(rest);
    pairs
}

/// Transition for variation `index` given `pair_count` distinct pairs.
///
/// Each pass over the pairs shifts the transition offset by 3, which is
/// coprime with 4, so repeated pairs land on a different transition until
/// every combination has been used once.
fn transition_for(index: usize, pair_count: usize) -> Transition {
    let slot = (index % pair_count + 3 * (index / pair_count)) % Transition::ALL.len();
    Transition::ALL[slot]
}

/// Clamp `base × pacing factor` into the duration bounds, rounded to 0.1 s.
#[must_use]
pub fn target_duration(source_duration_secs: f64, pacing: Pacing) -> f64 {
    let base = if source_duration_secs.is_finite() && source_duration_secs > 0.0 {
        source_duration_secs
    } else {
        FALLBACK_BASE_DURATION
    };
    let rounded = (base * pacing.duration_factor() * 10.0).round() / 10.0;
    rounded.clamp(DURATION_MIN, DURATION_MAX)
}

fn variation_capabilities(
    strategy_capabilities: &BTreeSet<Capability>,
    input: &PlanGeneratorInput,
    transition: Transition,
) -> BTreeSet<Capability> {
    let mut caps = strategy_capabilities.clone();
    if input.source_aspect_ratio != Some(input.aspect_ratio) {
        caps.insert(Capability::Resize);
    }
    if transition != Transition::Cut {
        caps.insert(Capability::Transitions);
    }
    caps
}

/// Compile a fresh plan in `generating` state from the winning strategy.
///
/// Deterministic for a given `input.seed` apart from the plan id and
/// creation time. Engines are assigned provisionally by a dry-run route that
/// ignores backend availability; execution re-routes live.
#[must_use]
pub fn compile_plan(selection: &SelectionResult, input: &PlanGeneratorInput) -> CreativePlan {
    let strategy = &selection.strategy;
    let framework = strategy.framework;
    let strategy_capabilities = strategy.required_capabilities();
    let use_vps = input.vps_available && !input.routing.prefer_local;

    let pairs = hook_pacing_pairs((strategy.hook_type, framework.default_pacing()), input.seed);
    let pair_count = pairs.len();

    let variations: Vec<Variation> = (0..input.variation_count)
        .map(|index| {
            let (hook_type, pacing) = pairs[index % pair_count];
            let transitions = transition_for(index, pair_count);
            let target_duration = target_duration(input.source_duration_secs, pacing);
            let required_capabilities =
                variation_capabilities(&strategy_capabilities, input, transitions);

            let request = RouteRequest {
                variation_index: index,
                required_capabilities: required_capabilities.clone(),
                use_vps,
            };
            let (engine_id, engine_provider, cost_rate, engine_reason) = match route(
                &input.available_engines,
                &request,
                &input.routing,
                RouteMode::DryRun,
            ) {
                Ok(decision) => (
                    Some(decision.backend.id.clone()),
                    Some(decision.backend.provider.clone()),
                    decision.backend.cost_per_second,
                    decision.reasoning,
                ),
                Err(failure) => (
                    None,
                    None,
                    UNASSIGNED_COST_PER_SECOND,
                    format!("unassigned: {failure}"),
                ),
            };

            Variation {
                index,
                framework,
                hook_type,
                pacing,
                transitions,
                target_duration,
                required_capabilities,
                engine_id,
                engine_provider,
                use_vps,
                estimated_cost: cost_rate * target_duration,
                reasoning: VariationReasoning {
                    framework: format!(
                        "{framework} with {hook_type} hook at {pacing} pacing, {transitions} transitions"
                    ),
                    engine: engine_reason,
                },
            }
        })
        .collect();

    let optimized: f64 = variations.iter().map(|v| v.estimated_cost).sum();
    #[allow(clippy::cast_precision_loss)]
    let per_variation_average = if variations.is_empty() {
        0.0
    } else {
        optimized / variations.len() as f64
    };
    let assigned = variations.iter().filter(|v| v.engine_id.is_some()).count();

    let plan = CreativePlan {
        id: Uuid::new_v4(),
        status: PlanStatus::Generating,
        seed: input.seed,
        created_at: Utc::now(),
        locked_at: None,
        fingerprint: None,
        strategy_id: strategy.strategy_id.clone(),
        framework,
        audience: input.audience.clone(),
        global_settings: GlobalSettings {
            aspect_ratio: input.aspect_ratio,
            platform: input.platform,
            source_duration_secs: input.source_duration_secs,
        },
        execution_strategy: ExecutionStrategy {
            description: format!(
                "{} {framework} variation(s); {assigned} with a provisional engine; {}",
                variations.len(),
                if use_vps {
                    "VPS preferred"
                } else {
                    "VPS skipped"
                }
            ),
        },
        cost_estimate: CostEstimate {
            optimized,
            per_variation_average,
        },
        variations,
    };

    tracing::info!(
        plan_id = %plan.id,
        strategy = %plan.strategy_id,
        variations = plan.variations.len(),
        assigned,
        seed = plan.seed,
        "compiled creative plan"
    );
    plan
}

/// Compile, validate, and advance the plan to `validated` when it has no errors.
#[must_use]
pub fn compile_and_validate(
    selection: &SelectionResult,
    input: &PlanGeneratorInput,
) -> CompileOutcome {
    let mut plan = compile_plan(selection, input);
    let ctx = ValidationContext {
        backends: &input.available_engines,
        routing: input.routing,
    };
    // A freshly compiled plan is `generating`, so advancing cannot be rejected.
    let report = match validate_and_advance(&mut plan, &ctx) {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(plan_id = %plan.id, error = %err, "fresh plan rejected validation");
            let mut report = crate::validator::validate_plan(&plan, &ctx);
            report.errors.push(err.to_string());
            report
        }
    };

    CompileOutcome {
        plan,
        errors: report.errors,
        warnings: report.warnings,
    }
}

#[cfg(test)]
#[path = "compiler_test.rs"]
mod tests;
