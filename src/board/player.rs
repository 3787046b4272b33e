//! The two sides of a backgammon game and point-numbering helpers.
//!
//! Absolute point numbers run 1..=24 from player one's side: player one
//! moves from 24 down to 1 and bears off below 1, player two moves from 1 up
//! to 24 and bears off above 24. Each side also has its own "relative"
//! numbering in which 24 is the farthest point and 1 the deepest home point,
//! which is the numbering used in move notation.

/// Number of points on the board.
pub const POINT_COUNT: usize = 24;

/// Checkers each side owns.
pub const CHECKERS_PER_SIDE: u8 = 15;

/// Points in a home quadrant.
pub const HOME_POINTS: u8 = 6;

/// A side in the game.
///
/// The `#[repr(u8)]` attribute enables use as an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Player {
    /// Bottom side, uppercase in position notation, `1` in the turn field.
    One = 0,
    /// Top side, lowercase in position notation, `-1` in the turn field.
    Two = 1,
}

/// Both players in index order.
pub const ALL_PLAYERS: [Player; 2] = [Player::One, Player::Two];

impl Player {
    /// Returns the array index for this player.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the other side.
    #[inline]
    pub const fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Parses the external player number (1 or 2).
    pub fn from_number(n: u8) -> Option<Player> {
        match n {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    /// Returns the external player number (1 or 2).
    pub const fn number(self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    /// Returns the signed value used by the turn and cube-owner fields.
    pub const fn sign(self) -> i8 {
        match self {
            Player::One => 1,
            Player::Two => -1,
        }
    }

    /// Parses the signed turn/cube-owner value.
    pub fn from_sign(s: i8) -> Option<Player> {
        match s {
            1 => Some(Player::One),
            -1 => Some(Player::Two),
            _ => None,
        }
    }

    /// Converts a relative point (1..=24 from this player's side) to an
    /// absolute point number.
    #[inline]
    pub const fn to_absolute(self, relative: u8) -> u8 {
        match self {
            Player::One => relative,
            Player::Two => 25 - relative,
        }
    }

    /// Converts an absolute point number to this player's relative numbering.
    /// The mapping is its own inverse.
    #[inline]
    pub const fn to_relative(self, absolute: u8) -> u8 {
        self.to_absolute(absolute)
    }

    /// Converts one of this player's relative points to the opponent's
    /// relative numbering of the same physical point.
    #[inline]
    pub const fn to_relative_of(self, relative: u8) -> u8 {
        25 - relative
    }
}
