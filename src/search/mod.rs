//! Candidate scoring beyond the static evaluator.
//!
//! Rollouts estimate each candidate's winning chances by simulation; the
//! ranker merges those estimates with heuristic scores into one ordering.

pub mod ranker;
pub mod rollout;

pub use ranker::{rank, truncate, Candidate, Weights, HEURISTIC_SCALE};
pub use rollout::{estimate_equity, RolloutConfig, RolloutEstimate, DEFAULT_MAX_PLIES};
