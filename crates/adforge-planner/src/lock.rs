//! Freezing a validated plan for execution.

use std::sync::Arc;

use adforge_core::{CreativePlan, PlanEvent, PlanStatus, StateError, Variation};
use chrono::Utc;
use sha2::{Digest, Sha256};

/// A locked plan, shared read-only.
///
/// Only obtainable through [`lock_plan`] or [`LockedPlan::from_persisted`],
/// so holding one means the plan is `locked` and its fingerprint matched
/// when it was built. There is no unlock.
#[derive(Debug, Clone, PartialEq)]
pub struct LockedPlan(Arc<CreativePlan>);

impl LockedPlan {
    #[must_use]
    pub fn plan(&self) -> &CreativePlan {
        &self.0
    }

    /// Another handle to the same shared plan.
    #[must_use]
    pub fn shared(&self) -> Arc<CreativePlan> {
        Arc::clone(&self.0)
    }

    #[must_use]
    pub fn fingerprint(&self) -> &str {
        self.0.fingerprint.as_deref().unwrap_or_default()
    }

    /// Recompute the variations fingerprint and compare it with the stored one.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::FingerprintMismatch`] if they differ.
    pub fn verify(&self) -> Result<(), StateError> {
        check_fingerprint(&self.0)
    }

    /// Re-hydrate a locked plan loaded from storage.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::UnexpectedStatus`] if the plan is not locked, or
    /// [`StateError::FingerprintMismatch`] if its variations were edited.
    pub fn from_persisted(plan: CreativePlan) -> Result<Self, StateError> {
        if plan.status != PlanStatus::Locked {
            return Err(StateError::UnexpectedStatus {
                plan_id: plan.id.to_string(),
                expected: PlanStatus::Locked,
                actual: plan.status,
            });
        }
        check_fingerprint(&plan)?;
        Ok(Self(Arc::new(plan)))
    }
}

impl AsRef<CreativePlan> for LockedPlan {
    fn as_ref(&self) -> &CreativePlan {
        &self.0
    }
}

fn check_fingerprint(plan: &CreativePlan) -> Result<(), StateError> {
    let expected = variations_fingerprint(&plan.variations);
    if plan.fingerprint.as_deref() == Some(expected.as_str()) {
        Ok(())
    } else {
        Err(StateError::FingerprintMismatch {
            plan_id: plan.id.to_string(),
        })
    }
}

/// SHA-256 (hex) over a canonical line-per-variation serialization.
///
/// Floats are written at fixed precision so a plan that went through JSON
/// hashes the same as the in-memory original.
#[must_use]
pub fn variations_fingerprint(variations: &[Variation]) -> String {
    let canonical: String = variations
        .iter()
        .map(|v| {
            let caps: Vec<String> = v
                .required_capabilities
                .iter()
                .map(ToString::to_string)
                .collect();
            format!(
                "{}|{}|{}|{}|{}|{:.3}|{}|{}|{}|{}|{:.6}|{}|{}\n",
                v.index,
                v.framework,
                v.hook_type,
                v.pacing,
                v.transitions,
                v.target_duration,
                caps.join(","),
                v.engine_id.as_deref().unwrap_or("-"),
                v.engine_provider.as_deref().unwrap_or("-"),
                v.use_vps,
                v.estimated_cost,
                v.reasoning.framework,
                v.reasoning.engine,
            )
        })
        .collect();
    format!("{:x}", Sha256::digest(canonical.as_bytes()))
}

/// Lock a validated plan.
///
/// Sets `locked_at` and the variations fingerprint. Locking an already
/// locked plan is a no-op that returns an equal [`LockedPlan`].
///
/// # Errors
///
/// Returns [`StateError::InvalidTransition`] for a plan still `generating`,
/// or [`StateError::FingerprintMismatch`] for a locked plan whose variations
/// no longer match its fingerprint.
pub fn lock_plan(plan: &mut CreativePlan) -> Result<LockedPlan, StateError> {
    match plan.status {
        PlanStatus::Locked => {
            check_fingerprint(plan)?;
            tracing::debug!(plan_id = %plan.id, "plan already locked");
        }
        status => {
            plan.status = status.transition(PlanEvent::Lock)?;
            plan.locked_at = Some(Utc::now());
            plan.fingerprint = Some(variations_fingerprint(&plan.variations));
            tracing::info!(
                plan_id = %plan.id,
                variations = plan.variations.len(),
                fingerprint = plan.fingerprint.as_deref().unwrap_or_default(),
                "locked creative plan"
            );
        }
    }
    Ok(LockedPlan(Arc::new(plan.clone())))
}
