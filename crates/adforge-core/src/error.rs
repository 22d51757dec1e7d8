use thiserror::Error;

use crate::plan::{PlanEvent, PlanStatus};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read {kind} file {path}: {source}")]
    FileIo {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {kind} file: {source}")]
    FileParse {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config validation error: {0}")]
    Validation(String),
}

/// Illegal plan or variation state change.
///
/// Always a programming error at the call site: fatal to the call, never to
/// the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("cannot apply {event} to plan in state {from}")]
    InvalidTransition { from: PlanStatus, event: PlanEvent },

    #[error("plan {plan_id} must be {expected} but is {actual}")]
    UnexpectedStatus {
        plan_id: String,
        expected: PlanStatus,
        actual: PlanStatus,
    },

    #[error("invalid variation transition: {0}")]
    InvalidVariationTransition(String),

    #[error("locked plan {plan_id} fingerprint mismatch; variations were modified after lock")]
    FingerprintMismatch { plan_id: String },
}
