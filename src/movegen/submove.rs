//! Single-die move legality.
//!
//! Generates every legal checker movement for one die value, covering bar
//! entry, ordinary movement, hits and bearing off.

use crate::board::moves::{SubMove, BAR, OFF};
use crate::board::player::Player;
use crate::board::state::BoardState;

/// Returns true if `player` may land on its relative point `to`.
/// A point held by two or more opposing checkers is blocked.
#[inline]
pub fn is_open(state: &BoardState, player: Player, to: u8) -> bool {
    state.opponent_at(player, to) < 2
}

/// Generates all legal submoves for `player` using a single die.
///
/// Checkers on the bar must enter before anything else moves. Bearing off
/// requires every checker home; a die larger than the farthest checker's
/// distance bears that checker off. Hit flags are filled in.
pub fn legal_submoves(state: &BoardState, player: Player, die: u8) -> Vec<SubMove> {
    let mut subs = Vec::new();

    if state.bar[player.index()] > 0 {
        let to = BAR - die;
        if is_open(state, player, to) {
            subs.push(with_hit(state, player, SubMove::new(BAR, to)));
        }
        return subs;
    }

    let farthest = match state.farthest_checker(player) {
        Some(f) => f,
        None => return subs,
    };
    let bearing_off = state.all_home(player);

    for from in (1..=farthest).rev() {
        if state.own_at(player, from) == 0 {
            continue;
        }
        if from > die {
            let to = from - die;
            if is_open(state, player, to) {
                subs.push(with_hit(state, player, SubMove::new(from, to)));
            }
        } else if bearing_off && (from == die || from == farthest) {
            subs.push(SubMove::new(from, OFF));
        }
    }

    subs
}

fn with_hit(state: &BoardState, player: Player, sub: SubMove) -> SubMove {
    SubMove {
        hit: sub.to != OFF && state.opponent_at(player, sub.to) == 1,
        ..sub
    }
}

/// Finds which of the `available` die values a given submove consumes.
///
/// An exact distance match is preferred; otherwise the smallest larger die
/// that legally bears the checker off. Returns None if no die makes the
/// submove legal.
pub fn die_for_submove(
    state: &BoardState,
    player: Player,
    sub: SubMove,
    available: &[u8],
) -> Option<u8> {
    let mut dice: Vec<u8> = available.to_vec();
    dice.sort_unstable();
    dice.dedup();

    let legal_with = |die: u8| {
        legal_submoves(state, player, die)
            .iter()
            .any(|s| s.from == sub.from && s.to == sub.to)
    };

    let distance = sub.distance();
    if dice.contains(&distance) && legal_with(distance) {
        return Some(distance);
    }
    if sub.to == OFF {
        return dice
            .into_iter()
            .filter(|&d| d > distance)
            .find(|&d| legal_with(d));
    }
    None
}
