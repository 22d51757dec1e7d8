//! Render adapter seam and the registry pairing adapters with descriptors.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use adforge_core::{
    AspectRatio, BackendDescriptor, Capability, CreativePlan, Framework, HookType, Pacing,
    Platform, Transition, Variation,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RenderError;

/// Everything a backend needs to render one variation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderJob {
    pub plan_id: Uuid,
    pub variation_index: usize,
    pub framework: Framework,
    pub hook_type: HookType,
    pub pacing: Pacing,
    pub transitions: Transition,
    pub target_duration: f64,
    pub required_capabilities: BTreeSet<Capability>,
    pub aspect_ratio: AspectRatio,
    pub platform: Platform,
}

impl RenderJob {
    #[must_use]
    pub fn from_variation(plan: &CreativePlan, variation: &Variation) -> Self {
        Self {
            plan_id: plan.id,
            variation_index: variation.index,
            framework: variation.framework,
            hook_type: variation.hook_type,
            pacing: variation.pacing,
            transitions: variation.transitions,
            target_duration: variation.target_duration,
            required_capabilities: variation.required_capabilities.clone(),
            aspect_ratio: plan.global_settings.aspect_ratio,
            platform: plan.global_settings.platform,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub video_url: String,
}

/// A rendering service that can take a [`RenderJob`].
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(&self, job: &RenderJob) -> Result<RenderOutput, RenderError>;
}

/// Backend descriptors paired with the adapters that drive them.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    descriptors: Vec<BackendDescriptor>,
    adapters: HashMap<String, Arc<dyn RenderBackend>>,
}

impl BackendRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the backend with `descriptor.id`.
    pub fn register(&mut self, descriptor: BackendDescriptor, adapter: Arc<dyn RenderBackend>) {
        self.descriptors.retain(|d| d.id != descriptor.id);
        self.adapters.insert(descriptor.id.clone(), adapter);
        self.descriptors.push(descriptor);
    }

    #[must_use]
    pub fn descriptors(&self) -> &[BackendDescriptor] {
        &self.descriptors
    }

    #[must_use]
    pub fn adapter(&self, backend_id: &str) -> Option<Arc<dyn RenderBackend>> {
        self.adapters.get(backend_id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field(
                "backends",
                &self.descriptors.iter().map(|d| &d.id).collect::<Vec<_>>(),
            )
            .finish()
    }
}
