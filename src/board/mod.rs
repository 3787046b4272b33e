//! Board representation and game-state types.
//!
//! Contains the core data structures for sides, dice, moves, and the overall
//! game state.

pub mod dice;
pub mod moves;
pub mod player;
pub mod state;

pub use dice::{all_rolls, DiceField, DiceRoll};
pub use moves::{Move, SubMove, BAR, OFF};
pub use player::{Player, ALL_PLAYERS, CHECKERS_PER_SIDE, HOME_POINTS, POINT_COUNT};
pub use state::{BoardState, Cube, InvariantViolation, Layout};
