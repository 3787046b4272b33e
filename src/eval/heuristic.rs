//! Heuristic position evaluation.
//!
//! Scores a board from one side's perspective using handcrafted features:
//! pip-count differential, blot exposure to the opponent's next roll, home
//! board strength, checker distribution, and bear-off progress in a race.
//!
//! The evaluator reads only checker placement, so it is a pure function of
//! the layout: identical inputs always produce bit-identical output.

use crate::board::dice::all_rolls;
use crate::board::moves::BAR;
use crate::board::player::{Player, CHECKERS_PER_SIDE, HOME_POINTS};
use crate::board::state::BoardState;
use crate::movegen::is_open;

/// Points per pip of race lead.
const PIP_WEIGHT: f64 = 0.15;

/// Base cost of a blot being hit, scaled by hit probability.
const BLOT_BASE: f64 = 2.0;

/// Additional cost per pip a hit blot would lose, scaled by hit probability.
const BLOT_PIP_WEIGHT: f64 = 0.12;

/// Points per made point in the home board.
const HOME_POINT_WEIGHT: f64 = 1.5;

/// Points per distinct point occupied.
const SPREAD_WEIGHT: f64 = 0.35;

/// Penalty per checker beyond the third on one point.
const STACK_PENALTY: f64 = 0.3;

/// Points per checker borne off once the game is a race.
const BEAROFF_WEIGHT: f64 = 1.2;

/// Score of a position where a side has borne off every checker.
pub const WIN_SCORE: f64 = 1000.0;

/// The individual feature values behind a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Features {
    /// Opponent pips minus own pips.
    pub pip_lead: i32,
    /// Expected cost of own blots being hit next roll.
    pub blot_exposure: f64,
    /// Own made home points minus the opponent's.
    pub home_points: i32,
    /// Own distribution term minus the opponent's.
    pub flexibility: f64,
    /// Own checkers off minus the opponent's, counted only in a race.
    pub bearoff_lead: i32,
}

/// Counts made points (two or more checkers) in `player`'s home board.
#[inline]
pub fn made_home_points(state: &BoardState, player: Player) -> i32 {
    (1..=HOME_POINTS)
        .filter(|&rel| state.own_at(player, rel) >= 2)
        .count() as i32
}

/// Distribution term: rewards holding many points, penalizes tall stacks.
#[inline]
fn flexibility(state: &BoardState, player: Player) -> f64 {
    let mut held = 0i32;
    let mut excess = 0i32;
    for rel in 1..=24u8 {
        let n = state.own_at(player, rel) as i32;
        if n > 0 {
            held += 1;
        }
        if n > 3 {
            excess += n - 3;
        }
    }
    SPREAD_WEIGHT * held as f64 - STACK_PENALTY * excess as f64
}

/// Returns true if `shooter` can move a checker from its relative point
/// `from` exactly onto its relative point `target` using `steps` in order,
/// with every intermediate landing open.
#[inline]
fn path_reaches(state: &BoardState, shooter: Player, from: u8, target: u8, steps: &[u8]) -> bool {
    let mut at = from;
    for (i, &d) in steps.iter().enumerate() {
        if at <= d {
            return false;
        }
        at -= d;
        if at == target {
            return true;
        }
        if i + 1 < steps.len() && !is_open(state, shooter, at) {
            return false;
        }
    }
    false
}

/// Returns true if `shooter` hits its relative point `target` with the roll
/// `(d1, d2)`. Checkers on the bar must enter before others may move.
fn roll_hits(state: &BoardState, shooter: Player, target: u8, d1: u8, d2: u8) -> bool {
    let on_bar = state.bar[shooter.index()] as usize;

    let sequences: Vec<Vec<u8>> = if d1 == d2 {
        (1..=4).map(|k| vec![d1; k]).collect()
    } else {
        vec![vec![d1], vec![d2], vec![d1, d2], vec![d2, d1]]
    };
    let dice_count = if d1 == d2 { 4 } else { 2 };

    if on_bar > 0 {
        // From the bar: the shooting checker enters with its first die.
        if sequences
            .iter()
            .filter(|s| s.len() + on_bar - 1 <= dice_count)
            .any(|s| path_reaches(state, shooter, BAR, target, s))
        {
            return true;
        }
        // From the board: the bar checkers must enter with the other dice.
        if d1 == d2 {
            if !is_open(state, shooter, BAR - d1) || on_bar >= dice_count {
                return false;
            }
            let budget = dice_count - on_bar;
            return (1..=24u8).filter(|&r| state.own_at(shooter, r) > 0).any(|r| {
                (1..=budget).any(|k| path_reaches(state, shooter, r, target, &vec![d1; k]))
            });
        }
        if on_bar > 1 {
            return false;
        }
        return [(d1, d2), (d2, d1)].iter().any(|&(enter, shoot)| {
            is_open(state, shooter, BAR - enter)
                && (1..=24u8)
                    .filter(|&r| state.own_at(shooter, r) > 0)
                    .any(|r| path_reaches(state, shooter, r, target, &[shoot]))
        });
    }

    (1..=24u8)
        .filter(|&r| r > target && state.own_at(shooter, r) > 0)
        .any(|r| sequences.iter().any(|s| path_reaches(state, shooter, r, target, s)))
}

/// Probability (out of 36 rolls) that the opponent hits the blot on
/// `player`'s relative point `blot` with its next roll.
pub fn hit_probability(state: &BoardState, player: Player, blot: u8) -> f64 {
    let shooter = player.opponent();
    let target = player.to_relative_of(blot);
    let hits = all_rolls()
        .filter(|r| roll_hits(state, shooter, target, r.first(), r.second()))
        .count();
    hits as f64 / 36.0
}

/// Expected cost of `player`'s blots being hit by the opponent's next roll.
fn blot_exposure(state: &BoardState, player: Player) -> f64 {
    let mut cost = 0.0;
    for rel in 1..=24u8 {
        if state.own_at(player, rel) != 1 {
            continue;
        }
        let p = hit_probability(state, player, rel);
        if p > 0.0 {
            cost += p * (BLOT_BASE + BLOT_PIP_WEIGHT * (25 - rel) as f64);
        }
    }
    cost
}

/// Computes the feature values for `perspective`.
pub fn features(state: &BoardState, perspective: Player) -> Features {
    let opp = perspective.opponent();
    let race = state.is_race();

    Features {
        pip_lead: state.pip_count(opp) as i32 - state.pip_count(perspective) as i32,
        blot_exposure: if race { 0.0 } else { blot_exposure(state, perspective) },
        home_points: made_home_points(state, perspective) - made_home_points(state, opp),
        flexibility: flexibility(state, perspective) - flexibility(state, opp),
        bearoff_lead: if race {
            state.off[perspective.index()] as i32 - state.off[opp.index()] as i32
        } else {
            0
        },
    }
}

/// Evaluates a board for `perspective`. Larger is better for that side.
///
/// Components:
/// - Pip-count lead
/// - Blot exposure penalty (hit probability times what a hit would cost)
/// - Made home points relative to the opponent
/// - Checker distribution relative to the opponent
/// - Borne-off lead once the sides have disengaged
///
/// A side with all fifteen checkers off scores `WIN_SCORE` (or its negation).
pub fn score(state: &BoardState, perspective: Player) -> f64 {
    if state.off[perspective.index()] == CHECKERS_PER_SIDE {
        return WIN_SCORE;
    }
    if state.off[perspective.opponent().index()] == CHECKERS_PER_SIDE {
        return -WIN_SCORE;
    }

    let f = features(state, perspective);
    PIP_WEIGHT * f.pip_lead as f64 - f.blot_exposure
        + HOME_POINT_WEIGHT * f.home_points as f64
        + f.flexibility
        + BEAROFF_WEIGHT * f.bearoff_lead as f64
}

/// Evaluates a board from both sides' perspectives, indexed by player.
pub fn score_both(state: &BoardState) -> [f64; 2] {
    [score(state, Player::One), score(state, Player::Two)]
}
