//! Position evaluation.
//!
//! A pure static evaluator over board states, plus a bounded shared cache
//! in front of it.

pub mod cache;
pub mod heuristic;

pub use cache::{cached_score, CacheStats, HeuristicCache};
pub use heuristic::{score, score_both, Features, WIN_SCORE};
