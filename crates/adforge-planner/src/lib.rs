//! Plan compilation, validation, and locking.

pub mod compiler;
pub mod lock;
pub mod validator;

pub use compiler::{
    compile_and_validate, compile_plan, CompileOutcome, PlanGeneratorInput,
    UNASSIGNED_COST_PER_SECOND,
};
pub use lock::{lock_plan, variations_fingerprint, LockedPlan};
pub use validator::{validate_and_advance, validate_plan, ValidationContext, ValidationReport};
