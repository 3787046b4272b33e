//! gammon backgammon evaluator library.
//!
//! Exposes the board representation, move generation, evaluation, rollout
//! search and protocol modules for use by integration tests and the binary
//! entry point.

pub mod board;
pub mod engine;
pub mod eval;
pub mod movegen;
pub mod protocol;
pub mod search;

pub use engine::{Engine, EngineConfig, EngineError};
