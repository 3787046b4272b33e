//! Game state representation.
//!
//! Holds the complete snapshot of a backgammon position: checker placement,
//! bar and borne-off counts, side on roll, dice, cube, and match context.

use super::dice::DiceField;
use super::moves::{SubMove, BAR, OFF};
use super::player::{Player, ALL_PLAYERS, CHECKERS_PER_SIDE, HOME_POINTS, POINT_COUNT};

/// The doubling cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cube {
    /// Cube value is `2^exponent`.
    pub exponent: u8,
    /// None when the cube is centred.
    pub owner: Option<Player>,
}

impl Cube {
    pub fn centered() -> Self {
        Cube { exponent: 0, owner: None }
    }

    pub fn value(&self) -> u64 {
        1u64 << self.exponent.min(63)
    }
}

/// A side's checker count does not add up to fifteen.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("player {player} has {total} checkers (on board {on_board}, bar {bar}, off {off}), expected 15")]
pub struct InvariantViolation {
    pub player: u8,
    pub on_board: u32,
    pub bar: u8,
    pub off: u8,
    pub total: u32,
}

/// Checker placement only: the part of a position that move generation and
/// evaluation depend on. Used as a hash key for deduplication and caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    pub points: [Option<(Player, u8)>; POINT_COUNT],
    pub bar: [u8; 2],
    pub off: [u8; 2],
}

/// Complete board state at a point in time.
///
/// Uses fixed-size arrays indexed by absolute point (`point - 1`) and
/// `Player as usize`, so the state is cheap to copy during search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardState {
    /// Checkers on each absolute point 1..=24: Some((owner, count)) with count >= 1.
    pub points: [Option<(Player, u8)>; POINT_COUNT],
    pub bar: [u8; 2],
    pub off: [u8; 2],
    pub turn: Player,
    pub dice: DiceField,
    pub cube: Cube,
    pub score: [u32; 2],
    /// Jacoby rule in money play, Crawford game in match play.
    pub crawford_jacoby: bool,
    /// Zero for money play.
    pub match_length: u32,
    pub max_cube_exponent: u8,
}

/// Standard opening layout as (relative point, count) for each side.
const OPENING_LAYOUT: [(u8, u8); 4] = [(24, 2), (13, 5), (8, 3), (6, 5)];

impl BoardState {
    /// Creates an empty board with every checker borne off.
    pub fn empty(turn: Player) -> Self {
        BoardState {
            points: [None; POINT_COUNT],
            bar: [0; 2],
            off: [CHECKERS_PER_SIDE; 2],
            turn,
            dice: DiceField::Pending,
            cube: Cube::centered(),
            score: [0; 2],
            crawford_jacoby: false,
            match_length: 0,
            max_cube_exponent: 10,
        }
    }

    /// Creates the standard starting position.
    pub fn starting(turn: Player) -> Self {
        let mut state = BoardState::empty(turn);
        for player in ALL_PLAYERS {
            for (rel, count) in OPENING_LAYOUT {
                state.place(player, player.to_absolute(rel), count);
            }
        }
        state
    }

    /// Places `count` checkers of `player` on an absolute point, taking them
    /// from the borne-off tray. Returns false if the point holds the
    /// opponent's checkers or the tray is short.
    pub fn place(&mut self, player: Player, absolute: u8, count: u8) -> bool {
        if count == 0 || !(1..=24).contains(&absolute) || self.off[player.index()] < count {
            return false;
        }
        let slot = &mut self.points[absolute as usize - 1];
        match slot {
            Some((owner, n)) if *owner == player => *n += count,
            Some(_) => return false,
            None => *slot = Some((player, count)),
        }
        self.off[player.index()] -= count;
        true
    }

    /// Moves `count` of `player`'s borne-off checkers to the bar.
    pub fn place_on_bar(&mut self, player: Player, count: u8) -> bool {
        if self.off[player.index()] < count {
            return false;
        }
        self.off[player.index()] -= count;
        self.bar[player.index()] += count;
        true
    }

    /// Returns the occupant of an absolute point.
    #[inline]
    pub fn point(&self, absolute: u8) -> Option<(Player, u8)> {
        self.points[absolute as usize - 1]
    }

    /// Returns how many of `player`'s checkers stand on a relative point.
    #[inline]
    pub fn own_at(&self, player: Player, relative: u8) -> u8 {
        match self.point(player.to_absolute(relative)) {
            Some((p, n)) if p == player => n,
            _ => 0,
        }
    }

    /// Returns how many opposing checkers stand on `player`'s relative point.
    #[inline]
    pub fn opponent_at(&self, player: Player, relative: u8) -> u8 {
        self.own_at(player.opponent(), player.to_relative_of(relative))
    }

    /// Number of `player`'s checkers on the 24 points.
    pub fn on_board(&self, player: Player) -> u32 {
        self.points
            .iter()
            .filter_map(|p| match p {
                Some((owner, n)) if *owner == player => Some(*n as u32),
                _ => None,
            })
            .sum()
    }

    /// Checks that both sides account for exactly fifteen checkers.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        for player in ALL_PLAYERS {
            let on_board = self.on_board(player);
            let bar = self.bar[player.index()];
            let off = self.off[player.index()];
            let total = on_board + bar as u32 + off as u32;
            if total != CHECKERS_PER_SIDE as u32 {
                return Err(InvariantViolation {
                    player: player.number(),
                    on_board,
                    bar,
                    off,
                    total,
                });
            }
        }
        Ok(())
    }

    /// Total pips `player` needs to bear off every checker.
    pub fn pip_count(&self, player: Player) -> u32 {
        let mut pips = self.bar[player.index()] as u32 * BAR as u32;
        for rel in 1..=24u8 {
            pips += self.own_at(player, rel) as u32 * rel as u32;
        }
        pips
    }

    /// Returns the farthest relative point holding one of `player`'s
    /// checkers ([`BAR`] if any are on the bar), or None if all are off.
    pub fn farthest_checker(&self, player: Player) -> Option<u8> {
        if self.bar[player.index()] > 0 {
            return Some(BAR);
        }
        (1..=24u8).rev().find(|&rel| self.own_at(player, rel) > 0)
    }

    /// Returns true if every remaining checker of `player` is in its home
    /// quadrant, which is the precondition for bearing off.
    pub fn all_home(&self, player: Player) -> bool {
        match self.farthest_checker(player) {
            Some(rel) => rel <= HOME_POINTS,
            None => true,
        }
    }

    /// Returns true if the two sides have passed each other.
    pub fn is_race(&self) -> bool {
        if self.bar[0] > 0 || self.bar[1] > 0 {
            return false;
        }
        // Player one moves down the absolute numbering, player two up.
        let one_max = (1..=24u8).rev().find(|&a| matches!(self.point(a), Some((Player::One, _))));
        let two_min = (1..=24u8).find(|&a| matches!(self.point(a), Some((Player::Two, _))));
        match (one_max, two_min) {
            (Some(a), Some(b)) => a < b,
            _ => true,
        }
    }

    /// Returns the side that has borne off all fifteen checkers, if any.
    pub fn winner(&self) -> Option<Player> {
        ALL_PLAYERS
            .into_iter()
            .find(|p| self.off[p.index()] == CHECKERS_PER_SIDE)
    }

    /// Returns the checker placement of this state.
    pub fn layout(&self) -> Layout {
        Layout {
            points: self.points,
            bar: self.bar,
            off: self.off,
        }
    }

    /// Applies a submove for `player` without checking legality and returns
    /// it with the hit flag filled in. A lone opposing checker on the
    /// destination is sent to its owner's bar.
    pub fn apply_submove(&mut self, player: Player, sub: SubMove) -> SubMove {
        let me = player.index();
        if sub.from == BAR {
            debug_assert!(self.bar[me] > 0, "no checker on the bar");
            self.bar[me] -= 1;
        } else {
            let idx = player.to_absolute(sub.from) as usize - 1;
            match &mut self.points[idx] {
                Some((owner, n)) if *owner == player => {
                    *n -= 1;
                    if *n == 0 {
                        self.points[idx] = None;
                    }
                }
                _ => debug_assert!(false, "no checker to move at {}", sub.from),
            }
        }

        let mut hit = false;
        if sub.to == OFF {
            self.off[me] += 1;
        } else {
            let idx = player.to_absolute(sub.to) as usize - 1;
            match &mut self.points[idx] {
                Some((owner, n)) if *owner == player => *n += 1,
                Some((owner, n)) => {
                    debug_assert_eq!(*n, 1, "landing on a made point");
                    let opp = *owner;
                    self.bar[opp.index()] += 1;
                    self.points[idx] = Some((player, 1));
                    hit = true;
                }
                None => self.points[idx] = Some((player, 1)),
            }
        }

        SubMove { hit, ..sub }
    }

    /// Ends `mover`'s turn: the opponent is on roll with the dice not yet
    /// rolled, whatever the turn field held before.
    pub fn end_turn(&mut self, mover: Player) {
        self.turn = mover.opponent();
        self.dice = DiceField::Pending;
    }
}
