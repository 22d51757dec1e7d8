//! Scoring weights and acceptance thresholds for the decision pass.
//!
//! Defaults are the engine's documented baseline; deployments override them
//! with a YAML file (`ADFORGE_POLICY_PATH`). Missing keys keep their default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Fixed weights of `final_score`. Impact and trust add, risk and cost subtract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub impact: f64,
    pub risk: f64,
    pub cost: f64,
    pub trust: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            impact: 0.5,
            risk: 0.2,
            cost: 0.1,
            trust: 0.2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub weights: ScoreWeights,
    /// Problems below this severity never produce candidates.
    pub severity_floor: f64,
    /// Problems above this severity weigh `high_severity_weight` in impact.
    pub impact_severity_pivot: f64,
    pub high_severity_weight: f64,
    /// Every candidate below this impact means there is nothing worth fixing.
    pub impact_floor: f64,
    /// The winner's `final_score` must reach this.
    pub min_acceptance_score: f64,
    /// Candidates above this risk are never auto-selected.
    pub risk_ceiling: f64,
    /// Fewer segments than this cannot be scored reliably.
    pub min_segments: usize,
    /// How many of the most severe problems candidates focus on.
    pub max_focus_problems: usize,
    pub max_candidates: usize,
    /// Cost units that map to `cost_score = 1.0`.
    pub max_cost_units: f64,
    /// Confidence below this earns no trust bonus.
    pub min_trust_confidence: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            severity_floor: 0.3,
            impact_severity_pivot: 0.5,
            high_severity_weight: 1.5,
            impact_floor: 0.15,
            min_acceptance_score: 0.05,
            risk_ceiling: 0.8,
            min_segments: 2,
            max_focus_problems: 3,
            max_candidates: 24,
            max_cost_units: 6.0,
            min_trust_confidence: 0.25,
        }
    }
}

/// Load and validate a scoring policy from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_policy(path: &Path) -> Result<ScoringPolicy, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        kind: "policy",
        path: path.display().to_string(),
        source: e,
    })?;

    parse_policy(&content)
}

/// Parse and validate a scoring policy from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or a value is out of range.
pub fn parse_policy(content: &str) -> Result<ScoringPolicy, ConfigError> {
    let policy: ScoringPolicy = serde_yaml::from_str(content).map_err(|e| ConfigError::FileParse {
        kind: "policy",
        source: e,
    })?;

    policy.validate()?;

    Ok(policy)
}

impl ScoringPolicy {
    /// Check that weights are usable and thresholds are unit-interval values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("weights.impact", self.weights.impact),
            ("weights.risk", self.weights.risk),
            ("weights.cost", self.weights.cost),
            ("weights.trust", self.weights.trust),
            ("high_severity_weight", self.high_severity_weight),
            ("max_cost_units", self.max_cost_units),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.max_cost_units == 0.0 {
            return Err(ConfigError::Validation(
                "max_cost_units must be greater than zero".to_string(),
            ));
        }

        let unit = [
            ("severity_floor", self.severity_floor),
            ("impact_severity_pivot", self.impact_severity_pivot),
            ("impact_floor", self.impact_floor),
            ("min_acceptance_score", self.min_acceptance_score),
            ("risk_ceiling", self.risk_ceiling),
            ("min_trust_confidence", self.min_trust_confidence),
        ];
        for (name, value) in unit {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }

        if self.max_focus_problems == 0 || self.max_candidates == 0 {
            return Err(ConfigError::Validation(
                "max_focus_problems and max_candidates must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
