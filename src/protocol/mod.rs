//! Text formats at the engine boundary.
//!
//! Position notation for whole boards, move notation for submoves and
//! complete plays, and the JSON request/response shapes.

pub mod notation;
pub mod position;
pub mod request;

pub use notation::{format_move, format_submove, parse_submove, parse_submoves, NotationError};
pub use position::{decode, encode, PositionError};
pub use request::{DebugInfo, ErrorResponse, EvaluationRequest, EvaluationResponse};
