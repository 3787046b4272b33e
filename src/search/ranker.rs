//! Combining, ordering and truncating scored candidates.

use std::cmp::Ordering;

use serde::Serialize;

use crate::search::rollout::RolloutEstimate;

/// Fixed divisor that brings heuristic scores onto roughly the same scale
/// as a win probability. Ordinary positions score within a few tens.
pub const HEURISTIC_SCALE: f64 = 40.0;

/// Maps a heuristic score onto the combined scale.
#[inline]
pub fn normalize(heuristic: f64) -> f64 {
    heuristic / HEURISTIC_SCALE
}

/// A scored legal move.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub description: String,
    /// Encoded position after the move.
    pub position: String,
    pub heuristic_score: f64,
    /// Rollout win probability; 0 when no rollout was requested.
    pub mc_score: f64,
    pub trials_completed: u32,
    pub trials_requested: u32,
    pub partial: bool,
    pub combined_score: f64,
}

impl Candidate {
    /// Builds a candidate with its combined score filled in.
    pub fn new(
        description: String,
        position: String,
        heuristic_score: f64,
        rollout: Option<RolloutEstimate>,
        weights: Weights,
    ) -> Self {
        let (mc_score, trials_completed, trials_requested, partial) = match rollout {
            Some(r) => (r.probability, r.trials_completed, r.trials_requested, r.partial),
            None => (0.0, 0, 0, false),
        };
        Candidate {
            description,
            position,
            heuristic_score,
            mc_score,
            trials_completed,
            trials_requested,
            partial,
            combined_score: weights.combine(heuristic_score, mc_score),
        }
    }
}

/// Linear coefficients for the two score terms. They need not sum to one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub heuristic: f64,
    pub mc: f64,
}

impl Weights {
    #[inline]
    pub fn combine(self, heuristic: f64, mc: f64) -> f64 {
        // Adding +0.0 folds -0.0 into +0.0 so that total_cmp sees a tie.
        self.heuristic * normalize(heuristic) + self.mc * mc + 0.0
    }
}

/// Ranking order: combined score descending, then rollout score descending,
/// then description ascending.
pub fn compare(a: &Candidate, b: &Candidate) -> Ordering {
    b.combined_score
        .total_cmp(&a.combined_score)
        .then_with(|| b.mc_score.total_cmp(&a.mc_score))
        .then_with(|| a.description.cmp(&b.description))
}

/// Sorts candidates into ranking order.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(compare);
}

/// Returns the first `max` entries of an already ranked list.
pub fn truncate(ranked: &[Candidate], max: usize) -> Vec<Candidate> {
    ranked.iter().take(max).cloned().collect()
}
