//! Decision pass of the adforge engine.
//!
//! Turns an analysis report into strategy candidates, scores them with an
//! auditable breakdown, and either selects an explained winner or returns a
//! structured policy failure.

pub mod explain;
pub mod generator;
pub mod pipeline;
pub mod scorer;
pub mod selector;

pub use generator::generate_candidates;
pub use pipeline::generate_selection;
pub use scorer::{rank_strategies, score_candidate, score_candidates};
pub use selector::select_strategy;
