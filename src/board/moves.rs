//! Submoves and full-turn moves.
//!
//! Points in a submove use the mover's relative numbering: 24 is the
//! farthest point from home, 1 the deepest home point. The bar is
//! addressed as [`BAR`] and bearing off as [`OFF`], so the pip distance of
//! any submove is simply `from - to`.

use super::player::Player;
use crate::protocol::notation::format_move;

/// Relative point number of the mover's bar.
pub const BAR: u8 = 25;

/// Relative point number of the bear-off tray.
pub const OFF: u8 = 0;

/// A single checker movement using one die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubMove {
    pub from: u8,
    pub to: u8,
    /// Whether the submove captured a lone opposing checker.
    pub hit: bool,
}

impl SubMove {
    /// Creates a submove without a hit flag.
    pub fn new(from: u8, to: u8) -> Self {
        SubMove { from, to, hit: false }
    }

    /// Pips travelled by the checker.
    #[inline]
    pub fn distance(&self) -> u8 {
        self.from - self.to
    }

    pub fn is_entry(&self) -> bool {
        self.from == BAR
    }

    pub fn is_bear_off(&self) -> bool {
        self.to == OFF
    }
}

/// A full move for one turn: the ordered submoves and the die values they
/// consumed. An empty move is a forced pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub player: Player,
    pub submoves: Vec<SubMove>,
    /// Die value consumed by each submove, parallel to `submoves`.
    pub dice_used: Vec<u8>,
}

impl Move {
    /// Creates the empty move for a side that cannot play.
    pub fn pass(player: Player) -> Self {
        Move {
            player,
            submoves: Vec::new(),
            dice_used: Vec::new(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.submoves.is_empty()
    }

    /// Returns true if any submove hit an opposing checker.
    pub fn is_hit(&self) -> bool {
        self.submoves.iter().any(|s| s.hit)
    }

    /// Returns the canonical, order-independent description of the move.
    pub fn description(&self) -> String {
        format_move(&self.submoves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_includes_bar_and_off() {
        assert_eq!(SubMove::new(BAR, 20).distance(), 5);
        assert_eq!(SubMove::new(3, OFF).distance(), 3);
        assert_eq!(SubMove::new(13, 8).distance(), 5);
    }

    #[test]
    fn pass_move_is_empty() {
        let m = Move::pass(Player::One);
        assert!(m.is_pass());
        assert!(!m.is_hit());
        assert_eq!(m.description(), "pass");
    }

    #[test]
    fn hit_flag_propagates() {
        let m = Move {
            player: Player::One,
            submoves: vec![SubMove { from: 13, to: 7, hit: true }, SubMove::new(8, 7)],
            dice_used: vec![6, 1],
        };
        assert!(m.is_hit());
        assert!(!SubMove::new(13, 7).is_entry());
        assert!(SubMove::new(BAR, 22).is_entry());
        assert!(SubMove::new(2, OFF).is_bear_off());
    }
}
