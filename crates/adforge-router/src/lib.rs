//! Backend routing for plan variations.
//!
//! Matches a variation's required capabilities against capability-tagged
//! backend descriptors, honoring user tier, VPS preference, local preference,
//! and rendering mode. The same policy runs at plan time (dry run, availability
//! ignored) and at execution time (live).

use std::collections::BTreeSet;

use adforge_core::{
    BackendClass, BackendDescriptor, Capability, RenderingMode, RoutingContext, UserTier,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether backend availability is taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    /// Execution time: unavailable backends are rejected.
    Live,
    /// Plan time: availability is ignored.
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub variation_index: usize,
    pub required_capabilities: BTreeSet<Capability>,
    pub use_vps: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    Unavailable,
    TierTooLow { required: UserTier },
    MissingCapabilities { missing: Vec<Capability> },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Unavailable => write!(f, "unavailable"),
            RejectReason::TierTooLow { required } => write!(f, "requires {required:?} tier"),
            RejectReason::MissingCapabilities { missing } => {
                let names: Vec<String> = missing.iter().map(ToString::to_string).collect();
                write!(f, "missing {}", names.join("+"))
            }
        }
    }
}

/// A backend that was considered and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAttempt {
    pub backend_id: String,
    pub class: BackendClass,
    #[serde(flatten)]
    pub reason: RejectReason,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    pub variation_index: usize,
    /// Chosen backend.
    pub backend: BackendDescriptor,
    /// Further qualifying backends in chain order, for runtime fallback.
    pub fallbacks: Vec<BackendDescriptor>,
    /// Rejected backends ahead of the chosen one in the chain.
    pub fallback_depth: usize,
    pub attempted: Vec<RouteAttempt>,
    pub reasoning: String,
}

impl RoutingDecision {
    /// Chosen backend followed by every fallback, in order.
    pub fn chain(&self) -> impl Iterator<Item = &BackendDescriptor> {
        std::iter::once(&self.backend).chain(self.fallbacks.iter())
    }
}

/// No backend qualifies for a variation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("no backend qualifies for variation {variation_index} ({} rejected)", attempted.len())]
pub struct RoutingFailure {
    pub variation_index: usize,
    pub required_capabilities: BTreeSet<Capability>,
    pub attempted: Vec<RouteAttempt>,
}

/// Order backends the way the router tries them.
///
/// VPS-class backends come first only when `use_vps` is set; otherwise they
/// are left out. Then local before cloud when `prefer_local`, cloud before
/// local otherwise. Within a class, `Standard` mode tries the cheapest first
/// and `Premium` the highest quality first; remaining ties break on id.
#[must_use]
pub fn chain_order<'a>(
    backends: &'a [BackendDescriptor],
    use_vps: bool,
    ctx: &RoutingContext,
) -> Vec<&'a BackendDescriptor> {
    let mut classes = Vec::with_capacity(3);
    if use_vps {
        classes.push(BackendClass::Vps);
    }
    if ctx.prefer_local {
        classes.extend([BackendClass::Local, BackendClass::Cloud]);
    } else {
        classes.extend([BackendClass::Cloud, BackendClass::Local]);
    }

    let mut chain = Vec::with_capacity(backends.len());
    for class in classes {
        let mut tier: Vec<&BackendDescriptor> =
            backends.iter().filter(|b| b.class == class).collect();
        tier.sort_by(|a, b| {
            let primary = match ctx.rendering_mode {
                RenderingMode::Standard => a.cost_per_second.total_cmp(&b.cost_per_second),
                RenderingMode::Premium => b
                    .quality_score
                    .total_cmp(&a.quality_score)
                    .then_with(|| a.cost_per_second.total_cmp(&b.cost_per_second)),
            };
            primary.then_with(|| a.id.cmp(&b.id))
        });
        chain.extend(tier);
    }
    chain
}

fn reject_reason(
    backend: &BackendDescriptor,
    request: &RouteRequest,
    ctx: &RoutingContext,
    mode: RouteMode,
) -> Option<RejectReason> {
    if mode == RouteMode::Live && !backend.available {
        return Some(RejectReason::Unavailable);
    }
    if ctx.user_tier < backend.min_tier {
        return Some(RejectReason::TierTooLow {
            required: backend.min_tier,
        });
    }
    let missing = backend.missing_capabilities(&request.required_capabilities);
    if !missing.is_empty() {
        return Some(RejectReason::MissingCapabilities { missing });
    }
    None
}

/// Select a backend for one variation.
///
/// # Errors
///
/// Returns [`RoutingFailure`] carrying every rejected attempt when no backend
/// in the chain qualifies.
pub fn route(
    backends: &[BackendDescriptor],
    request: &RouteRequest,
    ctx: &RoutingContext,
    mode: RouteMode,
) -> Result<RoutingDecision, RoutingFailure> {
    let chain = chain_order(backends, request.use_vps, ctx);

    let mut attempted = Vec::new();
    let mut qualifying: Vec<&BackendDescriptor> = Vec::new();
    let mut fallback_depth = 0;

    for backend in &chain {
        match reject_reason(backend, request, ctx, mode) {
            Some(reason) => {
                if qualifying.is_empty() {
                    fallback_depth += 1;
                }
                attempted.push(RouteAttempt {
                    backend_id: backend.id.clone(),
                    class: backend.class,
                    reason,
                });
            }
            None => qualifying.push(backend),
        }
    }

    let Some((chosen, rest)) = qualifying.split_first() else {
        tracing::warn!(
            variation = request.variation_index,
            mode = ?mode,
            chain_len = chain.len(),
            "no backend qualifies for variation"
        );
        return Err(RoutingFailure {
            variation_index: request.variation_index,
            required_capabilities: request.required_capabilities.clone(),
            attempted,
        });
    };

    let skipped: Vec<String> = attempted
        .iter()
        .take(fallback_depth)
        .map(|a| format!("{} ({})", a.backend_id, a.reason))
        .collect();
    let mut reasoning = format!(
        "{} via {} [{}]: first qualifying backend of {} in chain",
        chosen.id,
        chosen.provider,
        chosen.class,
        chain.len()
    );
    if !skipped.is_empty() {
        reasoning.push_str(&format!("; skipped {}", skipped.join(", ")));
    }
    if request.use_vps && chosen.class != BackendClass::Vps {
        reasoning.push_str("; no VPS backend qualified, degraded to fallback");
    }

    tracing::info!(
        variation = request.variation_index,
        backend = %chosen.id,
        depth = fallback_depth,
        mode = ?mode,
        reasoning = %reasoning,
        "routed variation"
    );

    Ok(RoutingDecision {
        variation_index: request.variation_index,
        backend: (*chosen).clone(),
        fallbacks: rest.iter().map(|b| (*b).clone()).collect(),
        fallback_depth,
        attempted,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(id: &str, class: BackendClass, caps: &[Capability], cost: f64) -> BackendDescriptor {
        BackendDescriptor {
            id: id.to_string(),
            provider: format!("{id}-provider"),
            class,
            capabilities: caps.iter().copied().collect(),
            cost_per_second: cost,
            min_tier: UserTier::Free,
            available: true,
            quality_score: 0.5,
            endpoint: None,
        }
    }

    const FULL: &[Capability] = &[
        Capability::Trim,
        Capability::Merge,
        Capability::TextOverlay,
        Capability::Resize,
    ];

    fn request(caps: &[Capability], use_vps: bool) -> RouteRequest {
        RouteRequest {
            variation_index: 0,
            required_capabilities: caps.iter().copied().collect(),
            use_vps,
        }
    }

    fn fleet() -> Vec<BackendDescriptor> {
        vec![
            backend("cloud-b", BackendClass::Cloud, FULL, 0.03),
            backend("vps-a", BackendClass::Vps, FULL, 0.01),
            backend("cloud-a", BackendClass::Cloud, FULL, 0.02),
            backend("local-a", BackendClass::Local, &[Capability::Trim], 0.0),
        ]
    }

    #[test]
    fn vps_is_preferred_when_requested() {
        let decision = route(
            &fleet(),
            &request(&[Capability::Trim, Capability::Merge], true),
            &RoutingContext::default(),
            RouteMode::Live,
        )
        .unwrap();
        assert_eq!(decision.backend.id, "vps-a");
        assert_eq!(decision.fallback_depth, 0);
        let chain: Vec<&str> = decision.chain().map(|b| b.id.as_str()).collect();
        assert_eq!(chain, vec!["vps-a", "cloud-a", "cloud-b"]);
    }

    #[test]
    fn vps_is_skipped_when_not_requested() {
        let decision = route(
            &fleet(),
            &request(&[Capability::Trim], false),
            &RoutingContext::default(),
            RouteMode::Live,
        )
        .unwrap();
        assert_eq!(decision.backend.id, "cloud-a");
        assert!(decision.chain().all(|b| b.class != BackendClass::Vps));
    }

    #[test]
    fn unavailable_vps_falls_back_to_cheapest_cloud() {
        let mut backends = fleet();
        backends[1].available = false;
        let decision = route(
            &backends,
            &request(&[Capability::Merge], true),
            &RoutingContext::default(),
            RouteMode::Live,
        )
        .unwrap();
        assert_eq!(decision.backend.id, "cloud-a");
        assert_eq!(decision.fallback_depth, 1);
        assert_eq!(decision.attempted[0].reason, RejectReason::Unavailable);
        assert!(decision.reasoning.contains("degraded"), "{}", decision.reasoning);
    }

    #[test]
    fn dry_run_ignores_availability() {
        let mut backends = fleet();
        backends[1].available = false;
        let decision = route(
            &backends,
            &request(&[Capability::Merge], true),
            &RoutingContext::default(),
            RouteMode::DryRun,
        )
        .unwrap();
        assert_eq!(decision.backend.id, "vps-a");
    }

    #[test]
    fn prefer_local_puts_local_before_cloud() {
        let ctx = RoutingContext {
            prefer_local: true,
            ..RoutingContext::default()
        };
        let decision = route(&fleet(), &request(&[Capability::Trim], false), &ctx, RouteMode::Live)
            .unwrap();
        assert_eq!(decision.backend.id, "local-a");
    }

    #[test]
    fn capability_match_is_a_subset_check() {
        let ctx = RoutingContext {
            prefer_local: true,
            ..RoutingContext::default()
        };
        let decision = route(
            &fleet(),
            &request(&[Capability::Trim, Capability::TextOverlay], false),
            &ctx,
            RouteMode::Live,
        )
        .unwrap();
        assert_eq!(decision.backend.id, "cloud-a");
        assert_eq!(
            decision.attempted[0].reason,
            RejectReason::MissingCapabilities {
                missing: vec![Capability::TextOverlay]
            }
        );
    }

    #[test]
    fn tier_gates_backends() {
        let mut backends = fleet();
        for b in &mut backends {
            b.min_tier = UserTier::Pro;
        }
        let err = route(
            &backends,
            &request(&[Capability::Trim], true),
            &RoutingContext::default(),
            RouteMode::Live,
        )
        .unwrap_err();
        assert_eq!(err.attempted.len(), 4);
        assert!(err
            .attempted
            .iter()
            .all(|a| a.reason == RejectReason::TierTooLow { required: UserTier::Pro }));

        let pro = RoutingContext {
            user_tier: UserTier::Pro,
            ..RoutingContext::default()
        };
        assert!(route(&backends, &request(&[Capability::Trim], true), &pro, RouteMode::Live).is_ok());
    }

    #[test]
    fn premium_mode_prefers_quality() {
        let mut backends = fleet();
        backends[0].quality_score = 0.95;
        let ctx = RoutingContext {
            rendering_mode: RenderingMode::Premium,
            ..RoutingContext::default()
        };
        let decision = route(&backends, &request(&[Capability::Trim], false), &ctx, RouteMode::Live)
            .unwrap();
        assert_eq!(decision.backend.id, "cloud-b");
    }

    #[test]
    fn failure_carries_attempted_chain() {
        let err = route(
            &fleet(),
            &request(&[Capability::SpeedRamp], true),
            &RoutingContext::default(),
            RouteMode::Live,
        )
        .unwrap_err();
        let ids: Vec<&str> = err.attempted.iter().map(|a| a.backend_id.as_str()).collect();
        assert_eq!(ids, vec!["vps-a", "cloud-a", "cloud-b", "local-a"]);
        assert!(err.to_string().contains("4 rejected"));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["attempted"][0]["reason"], "missing_capabilities");
    }
}
