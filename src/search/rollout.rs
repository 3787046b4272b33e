//! Monte Carlo rollouts.
//!
//! Plays a candidate position forward many times with random dice, both
//! sides choosing moves greedily by the heuristic evaluator, and reports the
//! fraction of trials won by the side that made the candidate move.

use std::time::Instant;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::board::dice::DiceRoll;
use crate::board::player::Player;
use crate::board::state::BoardState;
use crate::eval::cache::{cached_score, HeuristicCache};
use crate::movegen::{generate, GeneratedMove, MoveGenError};

/// Default number of plies simulated before a trial is cut off.
pub const DEFAULT_MAX_PLIES: u32 = 64;

/// Rollout parameters that stay fixed across candidates.
#[derive(Debug, Clone, Copy)]
pub struct RolloutConfig {
    /// Plies per trial before the heuristic adjudicates.
    pub max_plies: u32,
    /// Base seed. None draws every trial's generator from entropy.
    pub seed: Option<u64>,
    /// Trials not yet started when this passes are skipped.
    pub deadline: Option<Instant>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        RolloutConfig {
            max_plies: DEFAULT_MAX_PLIES,
            seed: None,
            deadline: None,
        }
    }
}

/// Win-probability estimate for one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RolloutEstimate {
    /// Fraction of completed trials won, in [0, 1].
    pub probability: f64,
    pub trials_completed: u32,
    pub trials_requested: u32,
    /// True when the deadline cut the rollout short.
    pub partial: bool,
}

impl RolloutEstimate {
    /// Estimate for a candidate nobody rolled out.
    pub fn empty(trials_requested: u32) -> Self {
        RolloutEstimate {
            probability: 0.5,
            trials_completed: 0,
            trials_requested,
            partial: trials_requested > 0,
        }
    }
}

/// Mixes a candidate description into the base seed so that different
/// candidates do not replay the same dice.
fn candidate_seed(seed: u64, key: &str) -> u64 {
    // FNV-1a
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in key.bytes() {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    seed ^ h
}

/// Estimates how often `perspective` wins from `board`.
///
/// `board` is a position after `perspective` has moved, with the opponent on
/// roll. Trials run in parallel on the current rayon pool; the deadline is
/// checked before each trial starts and trials in flight always finish.
/// `key` identifies the candidate for seed derivation.
pub fn estimate_equity(
    board: &BoardState,
    perspective: Player,
    trials: u32,
    key: &str,
    config: &RolloutConfig,
    cache: Option<&HeuristicCache>,
) -> Result<RolloutEstimate, MoveGenError> {
    if trials == 0 {
        return Ok(RolloutEstimate::empty(0));
    }

    let base = config.seed.map(|s| candidate_seed(s, key));
    let outcomes: Vec<Option<f64>> = (0..trials)
        .into_par_iter()
        .map(|i| {
            if let Some(deadline) = config.deadline {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }
            let mut rng = match base {
                Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(i as u64)),
                None => SmallRng::from_entropy(),
            };
            simulate_trial(board, perspective, config.max_plies, &mut rng, cache).map(Some)
        })
        .collect::<Result<_, _>>()?;

    let completed: Vec<f64> = outcomes.into_iter().flatten().collect();
    if completed.is_empty() {
        return Ok(RolloutEstimate::empty(trials));
    }
    let n = completed.len() as u32;
    let wins: f64 = completed.iter().sum();
    Ok(RolloutEstimate {
        probability: wins / n as f64,
        trials_completed: n,
        trials_requested: trials,
        partial: n < trials,
    })
}

/// Plays one game forward from `board` for at most `max_plies` plies.
///
/// Returns 1.0 if `perspective` wins, 0.0 if it loses, and 0.5 when the
/// heuristic scores at the cutoff are exactly equal.
pub fn simulate_trial(
    board: &BoardState,
    perspective: Player,
    max_plies: u32,
    rng: &mut SmallRng,
    cache: Option<&HeuristicCache>,
) -> Result<f64, MoveGenError> {
    let mut state = *board;
    for _ply in 0..max_plies {
        if let Some(winner) = state.winner() {
            return Ok(if winner == perspective { 1.0 } else { 0.0 });
        }
        let mover = state.turn;
        let dice = DiceRoll::random(rng);
        match choose_move(&state, mover, dice, cache)? {
            Some(chosen) => state = chosen.board,
            None => state.end_turn(mover),
        }
    }
    if let Some(winner) = state.winner() {
        return Ok(if winner == perspective { 1.0 } else { 0.0 });
    }

    let own = cached_score(cache, &state, perspective);
    let other = cached_score(cache, &state, perspective.opponent());
    Ok(if own > other {
        1.0
    } else if own < other {
        0.0
    } else {
        0.5
    })
}

/// Greedy one-ply policy: the legal move whose resulting position scores
/// best for `player`. Ties go to the smallest description. Returns None when
/// the side cannot move.
pub fn choose_move(
    state: &BoardState,
    player: Player,
    dice: DiceRoll,
    cache: Option<&HeuristicCache>,
) -> Result<Option<GeneratedMove>, MoveGenError> {
    let moves = generate(state, dice, player, &[])?;
    let mut best: Option<(f64, GeneratedMove)> = None;
    // Moves arrive sorted by description, so strict improvement keeps the
    // smallest description among equals.
    for m in moves {
        let s = cached_score(cache, &m.board, player);
        match &best {
            Some((b, _)) if s <= *b => {}
            _ => best = Some((s, m)),
        }
    }
    Ok(best.map(|(_, m)| m))
}
