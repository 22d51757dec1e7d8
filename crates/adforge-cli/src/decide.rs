//! `select` and `plan` command handlers.

use std::path::Path;

use adforge_brain::generate_selection;
use adforge_core::{
    load_backends, load_policy, AnalysisReport, AppConfig, Audience, Decision, ScoringPolicy,
};
use adforge_planner::{compile_and_validate, PlanGeneratorInput};
use anyhow::Context;

use crate::PlanArgs;

pub(crate) fn load_report(path: &Path) -> anyhow::Result<AnalysisReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read analysis report {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse analysis report {}", path.display()))
}

fn scoring_policy(config: &AppConfig) -> anyhow::Result<ScoringPolicy> {
    match &config.policy_path {
        Some(path) => Ok(load_policy(path)?),
        None => Ok(ScoringPolicy::default()),
    }
}

pub(crate) fn audience_from(args: &PlanArgs) -> Option<Audience> {
    match (&args.language, &args.country) {
        (Some(language), Some(country)) => Some(Audience {
            language: language.clone(),
            country: country.clone(),
            market: args.market.clone(),
        }),
        _ => None,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the decision for a report.
///
/// # Errors
///
/// Returns an error if the policy or report cannot be loaded.
pub(crate) fn run_select(config: &AppConfig, report_path: &Path) -> anyhow::Result<()> {
    let policy = scoring_policy(config)?;
    let report = load_report(report_path)?;
    let decision = generate_selection(&report, &policy);
    print_json(&decision)
}

/// Select a strategy and compile it into a plan.
///
/// A decision without a winner is printed and no plan is written. A plan
/// with validation errors is still written so it can be inspected.
///
/// # Errors
///
/// Returns an error if the policy, report, or backends file cannot be
/// loaded, or the plan cannot be written.
pub(crate) fn run_plan(config: &AppConfig, args: &PlanArgs) -> anyhow::Result<()> {
    let policy = scoring_policy(config)?;
    let report = load_report(&args.report)?;

    let decision = generate_selection(&report, &policy);
    let Decision::Selected(selection) = &decision else {
        tracing::warn!("no strategy selected; no plan compiled");
        return print_json(&decision);
    };

    let backends = load_backends(&config.backends_path)?.backends;
    let input = PlanGeneratorInput {
        variation_count: args.variations,
        platform: args.platform,
        aspect_ratio: args.aspect_ratio,
        source_aspect_ratio: args.source_aspect_ratio,
        source_duration_secs: report.source_duration_secs,
        vps_available: args.vps,
        available_engines: backends,
        audience: audience_from(args),
        routing: args.routing.context(),
        seed: args.seed.unwrap_or_else(rand::random),
    };

    let outcome = compile_and_validate(selection, &input);
    for warning in &outcome.warnings {
        tracing::warn!(plan_id = %outcome.plan.id, warning = %warning, "plan warning");
    }

    if let Some(out) = &args.out {
        let json = serde_json::to_string_pretty(&outcome.plan)?;
        std::fs::write(out, json)
            .with_context(|| format!("failed to write plan {}", out.display()))?;
        tracing::info!(plan_id = %outcome.plan.id, path = %out.display(), "plan written");
    }
    print_json(&outcome)
}
