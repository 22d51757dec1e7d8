use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A rendering operation a backend can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Trim,
    Merge,
    TextOverlay,
    Resize,
    SpeedRamp,
    Transitions,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Trim => write!(f, "trim"),
            Capability::Merge => write!(f, "merge"),
            Capability::TextOverlay => write!(f, "text_overlay"),
            Capability::Resize => write!(f, "resize"),
            Capability::SpeedRamp => write!(f, "speed_ramp"),
            Capability::Transitions => write!(f, "transitions"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendClass {
    Vps,
    Cloud,
    Local,
}

impl std::fmt::Display for BackendClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendClass::Vps => write!(f, "vps"),
            BackendClass::Cloud => write!(f, "cloud"),
            BackendClass::Local => write!(f, "local"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl std::str::FromStr for UserTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "free" => Ok(UserTier::Free),
            "pro" => Ok(UserTier::Pro),
            "enterprise" => Ok(UserTier::Enterprise),
            other => Err(format!("unknown user tier '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingMode {
    /// Cheapest qualifying backend first.
    #[default]
    Standard,
    /// Highest-quality qualifying backend first.
    Premium,
}

/// Caller context that shapes backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingContext {
    pub user_tier: UserTier,
    pub prefer_local: bool,
    pub rendering_mode: RenderingMode,
}

fn default_available() -> bool {
    true
}

fn default_quality() -> f64 {
    0.5
}

/// Capability-tagged description of a rendering backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub id: String,
    pub provider: String,
    pub class: BackendClass,
    pub capabilities: BTreeSet<Capability>,
    pub cost_per_second: f64,
    #[serde(default)]
    pub min_tier: UserTier,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default = "default_quality")]
    pub quality_score: f64,
    /// Base URL for HTTP-driven backends.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl BackendDescriptor {
    /// Capabilities in `required` this backend does not advertise.
    #[must_use]
    pub fn missing_capabilities(&self, required: &BTreeSet<Capability>) -> Vec<Capability> {
        required.difference(&self.capabilities).copied().collect()
    }

    #[must_use]
    pub fn supports(&self, required: &BTreeSet<Capability>) -> bool {
        required.is_subset(&self.capabilities)
    }
}

#[derive(Debug, Deserialize)]
pub struct BackendsFile {
    pub backends: Vec<BackendDescriptor>,
}

/// Load and validate backend descriptors from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_backends(path: &Path) -> Result<BackendsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        kind: "backends",
        path: path.display().to_string(),
        source: e,
    })?;

    parse_backends(&content)
}

/// Parse and validate backend descriptors from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_backends(content: &str) -> Result<BackendsFile, ConfigError> {
    let file: BackendsFile = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        kind: "backends",
        source: e,
    })?;

    validate_backends(&file)?;

    Ok(file)
}

fn validate_backends(file: &BackendsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for backend in &file.backends {
        if backend.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(backend.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate backend id: '{}'",
                backend.id
            )));
        }

        if !backend.cost_per_second.is_finite() || backend.cost_per_second < 0.0 {
            return Err(ConfigError::Validation(format!(
                "backend '{}' has invalid cost_per_second {}",
                backend.id, backend.cost_per_second
            )));
        }

        if !(0.0..=1.0).contains(&backend.quality_score) {
            return Err(ConfigError::Validation(format!(
                "backend '{}' has quality_score {} outside [0, 1]",
                backend.id, backend.quality_score
            )));
        }
    }

    Ok(())
}
