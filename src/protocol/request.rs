//! JSON request and response shapes.
//!
//! One `EvaluationRequest` per line in, one `EvaluationResponse` or
//! `ErrorResponse` per line out. Optional request fields have fixed
//! defaults; `maxTopMoves` has none and must be given.

use serde::{Deserialize, Serialize};

use crate::search::ranker::Candidate;

fn default_heuristic_weight() -> f64 {
    1.0
}

/// An evaluation request as received from a caller.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EvaluationRequest {
    /// Encoded position.
    pub position: String,
    /// 1 or 2.
    pub player_to_move: u8,
    /// The roll, or `[0, 0]` to use the dice recorded in the position.
    pub dice: [u8; 2],
    /// Submoves already played this turn, in order, e.g. `["13/7"]`.
    #[serde(default)]
    pub already_used_submoves: Vec<String>,
    #[serde(default = "default_heuristic_weight")]
    pub heuristic_weight: f64,
    #[serde(default)]
    pub mc_weight: f64,
    /// Rollout trials per candidate; 0 ranks on the heuristic alone.
    #[serde(default)]
    pub num_simulations: u32,
    pub max_top_moves: usize,
    #[serde(default)]
    pub debug: bool,
    /// Time budget for rollouts, measured from when evaluation starts.
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    /// Overrides the engine seed for this request.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl EvaluationRequest {
    /// A heuristic-only request with every optional field at its default.
    pub fn new(position: &str, player_to_move: u8, dice: [u8; 2], max_top_moves: usize) -> Self {
        EvaluationRequest {
            position: position.to_string(),
            player_to_move,
            dice,
            already_used_submoves: Vec::new(),
            heuristic_weight: default_heuristic_weight(),
            mc_weight: 0.0,
            num_simulations: 0,
            max_top_moves,
            debug: false,
            deadline_ms: None,
            seed: None,
        }
    }
}

/// Extra detail returned when `debug` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// The roll that was played.
    pub dice: [u8; 2],
    pub candidate_count: usize,
    /// Every candidate in ranking order, before truncation.
    pub ranked: Vec<Candidate>,
}

/// A successful evaluation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResponse {
    pub moves: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugInfo>,
}

/// A failed evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    /// Error category, e.g. `parse` or `invalidRequest`.
    pub error: String,
    pub message: String,
}

/// Parses one request line.
pub fn parse_request(line: &str) -> Result<EvaluationRequest, serde_json::Error> {
    serde_json::from_str(line)
}
