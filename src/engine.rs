//! Request evaluation.
//!
//! Owns the worker pool and the shared heuristic cache, and runs one
//! request through decoding, move generation, scoring, rollouts and ranking.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use rayon::prelude::*;

use crate::board::dice::DiceRoll;
use crate::board::player::Player;
use crate::board::state::InvariantViolation;
use crate::eval::cache::{cached_score, HeuristicCache};
use crate::movegen::{generate, MoveGenError};
use crate::protocol::notation::{parse_submoves, NotationError};
use crate::protocol::position::{decode, encode, PositionError};
use crate::protocol::request::{
    parse_request, DebugInfo, ErrorResponse, EvaluationRequest, EvaluationResponse,
};
use crate::search::ranker::{rank, truncate, Candidate, Weights};
use crate::search::rollout::{estimate_equity, RolloutConfig, DEFAULT_MAX_PLIES};

/// Default number of cached heuristic scores.
pub const DEFAULT_CACHE_CAPACITY: usize = 65_536;

/// Engine-wide settings fixed at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Worker threads for scoring and rollouts.
    pub threads: usize,
    /// Heuristic cache entries; 0 disables the cache.
    pub cache_capacity: usize,
    /// Plies per rollout trial before adjudication.
    pub max_plies: u32,
    /// Rollout budget for requests that do not give one.
    pub default_deadline: Option<Duration>,
    /// Base rollout seed for requests that do not give one. None uses
    /// entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_plies: DEFAULT_MAX_PLIES,
            default_deadline: None,
            seed: None,
        }
    }
}

/// Errors that abort a request.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("malformed position: {0}")]
    Parse(#[from] PositionError),

    #[error("malformed submove: {0}")]
    Notation(#[from] NotationError),

    #[error("board invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl EngineError {
    /// Short category name used in error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Parse(_) => "parse",
            EngineError::Notation(_) => "notation",
            EngineError::Invariant(_) => "invariant",
            EngineError::InvalidRequest(_) => "invalidRequest",
            EngineError::Json(_) => "json",
            EngineError::ThreadPool(_) => "threadPool",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<MoveGenError> for EngineError {
    fn from(e: MoveGenError) -> Self {
        match e {
            MoveGenError::Invariant(v) => EngineError::Invariant(v),
            other => EngineError::InvalidRequest(other.to_string()),
        }
    }
}

/// Evaluates requests. Stateless between requests apart from the cache.
pub struct Engine {
    config: EngineConfig,
    pool: rayon::ThreadPool,
    cache: Option<Arc<HeuristicCache>>,
}

impl Engine {
    /// Creates an engine with its own cache sized from the config.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let cache = (config.cache_capacity > 0)
            .then(|| Arc::new(HeuristicCache::new(config.cache_capacity)));
        Engine::with_cache(config, cache)
    }

    /// Creates an engine around an existing cache, which may be shared with
    /// other engines.
    pub fn with_cache(
        config: EngineConfig,
        cache: Option<Arc<HeuristicCache>>,
    ) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.threads.max(1))
            .build()?;
        debug!(
            "engine ready: {} threads, cache {}",
            config.threads.max(1),
            cache.as_ref().map_or(0, |c| c.capacity())
        );
        Ok(Engine {
            config,
            pool,
            cache,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&HeuristicCache> {
        self.cache.as_deref()
    }

    /// Evaluates one request and returns the ranked moves.
    ///
    /// A side with no legal move gets an empty list. Rollouts stop starting
    /// new trials at the deadline; candidates are still ranked on whatever
    /// trials finished.
    pub fn evaluate(&self, req: &EvaluationRequest) -> Result<EvaluationResponse, EngineError> {
        let start = Instant::now();

        if req.max_top_moves == 0 {
            return Err(EngineError::InvalidRequest(
                "maxTopMoves must be at least 1".to_string(),
            ));
        }
        if !req.heuristic_weight.is_finite() || !req.mc_weight.is_finite() {
            return Err(EngineError::InvalidRequest(
                "weights must be finite".to_string(),
            ));
        }

        let state = decode(&req.position)?;
        state.validate()?;
        let player = Player::from_number(req.player_to_move).ok_or_else(|| {
            EngineError::InvalidRequest(format!(
                "playerToMove must be 1 or 2, got {}",
                req.player_to_move
            ))
        })?;
        let dice = match req.dice {
            [0, 0] => state.dice.roll().ok_or_else(|| {
                EngineError::InvalidRequest(
                    "dice are pending and the position has no roll".to_string(),
                )
            })?,
            [a, b] => DiceRoll::new(a, b).ok_or_else(|| {
                EngineError::InvalidRequest(format!("invalid dice [{}, {}]", a, b))
            })?,
        };
        let prefix = parse_submoves(&req.already_used_submoves)?;

        let moves = generate(&state, dice, player, &prefix)?;
        debug!(
            "{} legal moves for player {} with {}-{}",
            moves.len(),
            player.number(),
            dice.first(),
            dice.second()
        );

        let weights = Weights {
            heuristic: req.heuristic_weight,
            mc: req.mc_weight,
        };
        // With zero weight rollouts would only feed the tie-break, which
        // must stay reproducible.
        let trials = if req.mc_weight != 0.0 {
            req.num_simulations
        } else {
            0
        };
        let rollout = RolloutConfig {
            max_plies: self.config.max_plies,
            seed: req.seed.or(self.config.seed),
            deadline: req
                .deadline_ms
                .map(Duration::from_millis)
                .or(self.config.default_deadline)
                .map(|d| start + d),
        };
        let cache = self.cache.as_deref();

        let mut candidates: Vec<Candidate> = self.pool.install(|| {
            moves
                .par_iter()
                .map(|m| -> Result<Candidate, EngineError> {
                    let heuristic = cached_score(cache, &m.board, player);
                    let estimate = if trials > 0 {
                        Some(estimate_equity(
                            &m.board,
                            player,
                            trials,
                            &m.description,
                            &rollout,
                            cache,
                        )?)
                    } else {
                        None
                    };
                    trace!("{}: heuristic {:.3}", m.description, heuristic);
                    Ok(Candidate::new(
                        m.description.clone(),
                        encode(&m.board),
                        heuristic,
                        estimate,
                        weights,
                    ))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let partial = candidates.iter().filter(|c| c.partial).count();
        if partial > 0 {
            warn!(
                "deadline reached: {} of {} candidates have partial rollouts",
                partial,
                candidates.len()
            );
        }

        rank(&mut candidates);
        let top = truncate(&candidates, req.max_top_moves);
        let debug_info = req.debug.then(|| DebugInfo {
            dice: [dice.first(), dice.second()],
            candidate_count: candidates.len(),
            ranked: candidates,
        });

        debug!("evaluated in {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
        if let Some(c) = cache {
            let stats = c.stats();
            trace!(
                "cache: {} entries, hit rate {:.2}",
                stats.entries,
                stats.hit_rate()
            );
        }
        Ok(EvaluationResponse {
            moves: top,
            debug: debug_info,
        })
    }

    /// Parses a JSON request line and evaluates it.
    pub fn evaluate_json(&self, line: &str) -> Result<EvaluationResponse, EngineError> {
        let req = parse_request(line)?;
        self.evaluate(&req)
    }

    /// Handles one input line: writes one response line, or nothing for a
    /// blank line.
    pub fn handle_line<W: Write>(&self, line: &str, out: &mut W) -> std::io::Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let text = match self.evaluate_json(line) {
            Ok(resp) => serde_json::to_string(&resp),
            Err(e) => {
                debug!("request failed: {}", e);
                serde_json::to_string(&e.to_response())
            }
        }
        .map_err(std::io::Error::from)?;
        writeln!(out, "{}", text)?;
        out.flush()
    }

    /// Like `handle_line`, for raw input. A line that is not UTF-8 gets an
    /// error response.
    pub fn handle_bytes<W: Write>(&self, line: &[u8], out: &mut W) -> std::io::Result<()> {
        match std::str::from_utf8(line) {
            Ok(text) => self.handle_line(text, out),
            Err(e) => {
                debug!("request is not UTF-8: {}", e);
                let err = EngineError::InvalidRequest(format!("request is not valid UTF-8: {}", e));
                let text = serde_json::to_string(&err.to_response()).map_err(std::io::Error::from)?;
                writeln!(out, "{}", text)?;
                out.flush()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const OPENING: &str = "-b----E-C---eE---c-e----B-:0:0:1:65:0:0:0:0:10";

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            threads: 2,
            max_plies: 16,
            ..EngineConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn opening_65_heuristic_only() {
        let engine = engine();
        let req = EvaluationRequest::new(OPENING, 1, [6, 5], 20);
        let resp = engine.evaluate(&req).unwrap();
        assert!(!resp.moves.is_empty());
        assert!(resp.moves.len() <= 20);
        let top = resp.moves[0].heuristic_score;
        assert!(resp.moves.iter().all(|c| c.heuristic_score <= top));
        assert!(resp.moves.iter().all(|c| c.mc_score == 0.0));

        // Every candidate plays both dice.
        let state = decode(OPENING).unwrap();
        let dice = DiceRoll::new(6, 5).unwrap();
        let generated = generate(&state, dice, Player::One, &[]).unwrap();
        for c in &resp.moves {
            let g = generated.iter().find(|g| g.description == c.description).unwrap();
            assert_eq!(g.mv.dice_used.len(), 2);
            assert_eq!(encode(&g.board), c.position);
        }
    }

    #[test]
    fn heuristic_only_is_deterministic() {
        let engine = engine();
        let mut req = EvaluationRequest::new(OPENING, 1, [3, 1], 10);
        req.debug = true;
        let a = serde_json::to_string(&engine.evaluate(&req).unwrap()).unwrap();
        let b = serde_json::to_string(&engine.evaluate(&req).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn cache_does_not_change_ranking() {
        let cached = engine();
        let uncached = Engine::new(EngineConfig {
            threads: 2,
            cache_capacity: 0,
            ..EngineConfig::default()
        })
        .unwrap();
        assert!(uncached.cache().is_none());
        let req = EvaluationRequest::new(OPENING, 1, [4, 2], 20);
        // Run twice so the second pass is served from the cache.
        cached.evaluate(&req).unwrap();
        assert_eq!(cached.evaluate(&req).unwrap(), uncached.evaluate(&req).unwrap());
        assert!(cached.cache().unwrap().stats().hits > 0);
    }

    #[test]
    fn small_limit_is_prefix_of_large_ranking() {
        let engine = engine();
        let mut small = EvaluationRequest::new(OPENING, 1, [6, 5], 3);
        small.mc_weight = 0.4;
        small.num_simulations = 8;
        small.seed = Some(42);
        let mut large = small.clone();
        large.max_top_moves = 20;
        large.debug = true;

        let small = engine.evaluate(&small).unwrap();
        let large = engine.evaluate(&large).unwrap();
        let ranked = large.debug.unwrap().ranked;
        let top3: HashSet<&str> = ranked.iter().take(3).map(|c| c.description.as_str()).collect();
        assert!(small.moves.len() <= 3);
        for c in &small.moves {
            assert!(top3.contains(c.description.as_str()), "{}", c.description);
            assert_eq!(c.trials_completed, 8);
        }
    }

    #[test]
    fn result_positions_put_opponent_on_roll() {
        let engine = engine();
        // The position has player one on roll; the request moves player two.
        let resp = engine.evaluate(&EvaluationRequest::new(OPENING, 2, [6, 5], 3)).unwrap();
        assert!(!resp.moves.is_empty());
        for c in &resp.moves {
            let after = decode(&c.position).unwrap();
            assert_eq!(after.turn, Player::One, "{}", c.description);
        }
    }

    #[test]
    fn debug_lists_every_candidate() {
        let engine = engine();
        let mut req = EvaluationRequest::new(OPENING, 1, [6, 5], 1);
        req.debug = true;
        let resp = engine.evaluate(&req).unwrap();
        let info = resp.debug.unwrap();
        assert_eq!(resp.moves.len(), 1);
        assert_eq!(info.candidate_count, info.ranked.len());
        assert!(info.ranked.len() > 1);
        assert_eq!(info.ranked[0], resp.moves[0]);
        assert_eq!(info.dice, [6, 5]);
    }

    #[test]
    fn expired_deadline_still_ranks() {
        let engine = engine();
        let mut req = EvaluationRequest::new(OPENING, 1, [6, 5], 5);
        req.mc_weight = 0.5;
        req.num_simulations = 100;
        req.deadline_ms = Some(0);
        let resp = engine.evaluate(&req).unwrap();
        assert!(!resp.moves.is_empty());
        for c in &resp.moves {
            assert!(c.partial);
            assert_eq!(c.trials_requested, 100);
            assert!(c.trials_completed < 100);
        }
    }

    #[test]
    fn zero_mc_weight_skips_rollouts() {
        let engine = engine();
        let mut req = EvaluationRequest::new(OPENING, 1, [6, 5], 5);
        req.num_simulations = 50;
        let resp = engine.evaluate(&req).unwrap();
        assert!(resp.moves.iter().all(|c| c.trials_completed == 0 && !c.partial));
    }

    #[test]
    fn pending_dice_use_position_roll() {
        let engine = engine();
        let explicit = engine.evaluate(&EvaluationRequest::new(OPENING, 1, [6, 5], 20)).unwrap();
        let pending = engine.evaluate(&EvaluationRequest::new(OPENING, 1, [0, 0], 20)).unwrap();
        assert_eq!(explicit, pending);

        let unrolled = "-b----E-C---eE---c-e----B-:0:0:1:00:0:0:0:0:10";
        let err = engine
            .evaluate(&EvaluationRequest::new(unrolled, 1, [0, 0], 20))
            .unwrap_err();
        assert_eq!(err.kind(), "invalidRequest");
    }

    #[test]
    fn prefix_restricts_continuations() {
        let engine = engine();
        let mut req = EvaluationRequest::new(OPENING, 1, [6, 6], 50);
        req.already_used_submoves = vec!["24/18".to_string()];
        let resp = engine.evaluate(&req).unwrap();
        assert!(!resp.moves.is_empty());
        assert!(resp.moves.iter().all(|c| c.description.contains("24/18")));
    }

    #[test]
    fn forced_pass_is_empty() {
        let engine = engine();
        let req = EvaluationRequest::new("-EED--------------cbbbbbbA:0:0:1:43:0:0:0:0:10", 1, [4, 3], 5);
        let resp = engine.evaluate(&req).unwrap();
        assert!(resp.moves.is_empty());
    }

    #[test]
    fn bad_requests_are_rejected() {
        let engine = engine();
        let kind = |req: EvaluationRequest| engine.evaluate(&req).unwrap_err().kind();

        assert_eq!(kind(EvaluationRequest::new("garbage", 1, [6, 5], 5)), "parse");
        assert_eq!(kind(EvaluationRequest::new(OPENING, 3, [6, 5], 5)), "invalidRequest");
        assert_eq!(kind(EvaluationRequest::new(OPENING, 1, [7, 5], 5)), "invalidRequest");
        assert_eq!(kind(EvaluationRequest::new(OPENING, 1, [6, 5], 0)), "invalidRequest");

        let mut req = EvaluationRequest::new(OPENING, 1, [6, 5], 5);
        req.already_used_submoves = vec!["24-18".to_string()];
        assert_eq!(kind(req), "notation");

        let mut req = EvaluationRequest::new(OPENING, 1, [6, 5], 5);
        req.already_used_submoves = vec!["24/20".to_string()];
        assert_eq!(kind(req), "invalidRequest");
    }

    #[test]
    fn handle_line_writes_one_line() {
        let engine = engine();
        let mut out = Vec::new();
        let line = format!(
            r#"{{"position":"{}","playerToMove":1,"dice":[6,5],"maxTopMoves":2}}"#,
            OPENING
        );
        engine.handle_line(&line, &mut out).unwrap();
        engine.handle_line("   ", &mut out).unwrap();
        engine.handle_line("{not json", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let ok: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(ok["moves"].as_array().unwrap().len(), 2);
        assert!(ok.get("debug").is_none());
        let err: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(err["error"], "json");
    }

    #[test]
    fn non_utf8_line_gets_error_response() {
        let engine = engine();
        let mut out = Vec::new();
        engine.handle_bytes(b"{\"position\":\"\xff\"}", &mut out).unwrap();
        let line = format!(
            r#"{{"position":"{}","playerToMove":1,"dice":[6,5],"maxTopMoves":1}}"#,
            OPENING
        );
        engine.handle_bytes(line.as_bytes(), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let err: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(err["error"], "invalidRequest");
        let ok: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(ok["moves"].as_array().unwrap().len(), 1);
    }
}
