//! Legal move generation.
//!
//! Enumerates every legal way to play a roll, enforcing bar entry,
//! blocking, bear-off conditions, the forced-maximal-play rule and the
//! higher-die rule. Results are deduplicated by resulting position.

pub mod submove;

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use crate::board::dice::DiceRoll;
use crate::board::moves::{Move, SubMove};
use crate::board::player::Player;
use crate::board::state::{BoardState, InvariantViolation, Layout};
use crate::protocol::notation::format_submove;

pub use submove::{die_for_submove, is_open, legal_submoves};

/// Errors from move generation. A position with no legal move is not an
/// error; it yields an empty list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveGenError {
    #[error("already-played submove '{submove}' is not legal with the remaining dice {remaining:?}")]
    IllegalPrefix { submove: String, remaining: Vec<u8> },

    #[error("more submoves already played than the roll allows")]
    PrefixTooLong,

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// A legal move together with the position it produces.
///
/// The resulting position has the turn passed to the opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedMove {
    pub mv: Move,
    pub board: BoardState,
    /// Canonical description of `mv`, cached for sorting and tie-breaks.
    pub description: String,
}

/// A complete sequence found by the search.
struct Leaf {
    submoves: Vec<SubMove>,
    dice: Vec<u8>,
    board: BoardState,
}

/// Depth-first search state over the remaining dice.
struct Search {
    player: Player,
    leaves: Vec<Leaf>,
    /// Nodes already expanded, keyed by layout, sorted submoves and sorted
    /// remaining dice. Different orderings of the same submoves from the
    /// same start reach the same subtree.
    visited: HashSet<(Layout, Vec<SubMove>, Vec<u8>)>,
}

impl Search {
    fn expand(
        &mut self,
        board: &BoardState,
        remaining: &[u8],
        submoves: &mut Vec<SubMove>,
        dice: &mut Vec<u8>,
    ) {
        let mut key_moves = submoves.clone();
        key_moves.sort_unstable();
        let mut key_dice = remaining.to_vec();
        key_dice.sort_unstable_by(|a, b| b.cmp(a));
        if !self.visited.insert((board.layout(), key_moves, key_dice.clone())) {
            return;
        }

        let mut distinct = key_dice;
        distinct.dedup();

        let mut moved = false;
        for die in distinct {
            let rest = remove_one(remaining, die);
            for sub in legal_submoves(board, self.player, die) {
                moved = true;
                let mut next = *board;
                let played = next.apply_submove(self.player, sub);
                submoves.push(played);
                dice.push(die);
                self.expand(&next, &rest, submoves, dice);
                submoves.pop();
                dice.pop();
            }
        }

        if !moved {
            self.leaves.push(Leaf {
                submoves: submoves.clone(),
                dice: dice.clone(),
                board: *board,
            });
        }
    }
}

/// Returns `values` with one occurrence of `die` removed.
fn remove_one(values: &[u8], die: u8) -> Vec<u8> {
    let mut rest = values.to_vec();
    if let Some(pos) = rest.iter().position(|&d| d == die) {
        rest.remove(pos);
    }
    rest
}

/// Generates all legal moves for `player` with `dice`.
///
/// `already_used` is a prefix of submoves already played this turn (for a
/// turn entered one checker at a time). Each prefix submove must be legal
/// in order and consumes one die; the search continues with what is left
/// and every returned move starts with the prefix.
///
/// Only sequences that use the maximum achievable number of dice survive.
/// When just one die of a non-double can be played, the larger must be
/// played if possible. Moves reaching the same position are merged, keeping
/// the lexicographically smallest description. The result is sorted by
/// description, and is empty when the side cannot move.
pub fn generate(
    state: &BoardState,
    dice: DiceRoll,
    player: Player,
    already_used: &[SubMove],
) -> Result<Vec<GeneratedMove>, MoveGenError> {
    let mut remaining = dice.values();
    if already_used.len() > remaining.len() {
        return Err(MoveGenError::PrefixTooLong);
    }

    let mut board = *state;
    let mut prefix_moves = Vec::with_capacity(already_used.len());
    let mut prefix_dice = Vec::with_capacity(already_used.len());
    for &sub in already_used {
        let die = die_for_submove(&board, player, sub, &remaining).ok_or_else(|| {
            MoveGenError::IllegalPrefix {
                submove: format_submove(&sub),
                remaining: remaining.clone(),
            }
        })?;
        remaining = remove_one(&remaining, die);
        prefix_moves.push(board.apply_submove(player, sub));
        prefix_dice.push(die);
    }

    let mut search = Search {
        player,
        leaves: Vec::new(),
        visited: HashSet::new(),
    };
    let mut submoves = prefix_moves.clone();
    let mut used = prefix_dice.clone();
    search.expand(&board, &remaining, &mut submoves, &mut used);

    let prefix_len = prefix_moves.len();
    let max_used = search
        .leaves
        .iter()
        .map(|l| l.submoves.len() - prefix_len)
        .max()
        .unwrap_or(0);

    if max_used == 0 && prefix_len == 0 {
        return Ok(Vec::new());
    }

    let mut leaves: Vec<Leaf> = search
        .leaves
        .into_iter()
        .filter(|l| l.submoves.len() - prefix_len == max_used)
        .collect();

    // Higher-die rule: with two different dice and only one playable, the
    // larger must be played if it can be.
    if max_used == 1 && remaining.len() == 2 && remaining[0] != remaining[1] {
        let high = remaining[0].max(remaining[1]);
        if leaves.iter().any(|l| l.dice.last() == Some(&high)) {
            leaves.retain(|l| l.dice.last() == Some(&high));
        }
    }

    let mut by_layout: HashMap<Layout, GeneratedMove> = HashMap::with_capacity(leaves.len());
    for leaf in leaves {
        leaf.board.validate()?;
        let mv = Move {
            player,
            submoves: leaf.submoves,
            dice_used: leaf.dice,
        };
        let description = mv.description();
        let mut board = leaf.board;
        board.end_turn(player);

        match by_layout.entry(board.layout()) {
            Entry::Occupied(mut e) => {
                if description < e.get().description {
                    e.insert(GeneratedMove { mv, board, description });
                }
            }
            Entry::Vacant(e) => {
                e.insert(GeneratedMove { mv, board, description });
            }
        }
    }

    let mut moves: Vec<GeneratedMove> = by_layout.into_values().collect();
    moves.sort_by(|a, b| a.description.cmp(&b.description));
    Ok(moves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::moves::BAR;
    use crate::protocol::position::decode;

    fn roll(a: u8, b: u8) -> DiceRoll {
        DiceRoll::new(a, b).unwrap()
    }

    fn descriptions(moves: &[GeneratedMove]) -> Vec<&str> {
        moves.iter().map(|m| m.description.as_str()).collect()
    }

    #[test]
    fn opening_65_uses_both_dice() {
        let state = BoardState::starting(Player::One);
        let moves = generate(&state, roll(6, 5), Player::One, &[]).unwrap();
        assert!(!moves.is_empty());
        for m in &moves {
            assert_eq!(m.mv.submoves.len(), 2, "{}", m.description);
            let mut used = m.mv.dice_used.clone();
            used.sort_unstable();
            assert_eq!(used, vec![5, 6]);
            assert!(m.board.validate().is_ok());
            assert_eq!(m.board.turn, Player::Two);
        }
        assert!(descriptions(&moves).contains(&"24/18 18/13"));
        assert!(descriptions(&moves).contains(&"24/18 13/8"));
    }

    #[test]
    fn opening_moves_are_unique_by_position() {
        let state = BoardState::starting(Player::One);
        let moves = generate(&state, roll(3, 1), Player::One, &[]).unwrap();
        let layouts: HashSet<Layout> = moves.iter().map(|m| m.board.layout()).collect();
        assert_eq!(layouts.len(), moves.len());
        // 8/5 6/5 and 6/5 8/5 collapse into one entry.
        assert_eq!(
            descriptions(&moves).iter().filter(|d| **d == "8/5 6/5").count(),
            1
        );
    }

    #[test]
    fn doubles_play_four() {
        let state = BoardState::starting(Player::One);
        let moves = generate(&state, roll(6, 6), Player::One, &[]).unwrap();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.mv.submoves.len() == 4));
        assert!(descriptions(&moves).contains(&"24/18(2) 13/7(2)"));
    }

    #[test]
    fn dance_on_bar_is_empty() {
        // Player one on the bar facing a closed board.
        let state = decode("-EED--------------cbbbbbbA:0:0:1:43:0:0:0:0:10").unwrap();
        assert!(state.validate().is_ok());
        let moves = generate(&state, roll(4, 3), Player::One, &[]).unwrap();
        assert!(moves.is_empty());
    }

    #[test]
    fn must_use_both_dice_when_possible() {
        // Checkers on 10 and 3 with the 4-point blocked: the 6 cannot be
        // played first, but 10/5 brings everyone home and the 6 then bears
        // off the farthest checker.
        let mut state = BoardState::empty(Player::One);
        state.place(Player::One, 10, 1);
        state.place(Player::One, 3, 1);
        state.place(Player::Two, 4, 2);
        let moves = generate(&state, roll(6, 5), Player::One, &[]).unwrap();
        assert_eq!(descriptions(&moves), vec!["10/5 5/off"]);
        assert_eq!(moves[0].mv.dice_used, vec![5, 6]);
    }

    #[test]
    fn forced_order_to_keep_both_dice() {
        // A lone checker on 13 with the 7 and 2 points blocked: 13/7 is
        // blocked and after 13/8 the six lands on the blocked 2.
        let mut state = BoardState::empty(Player::One);
        state.place(Player::One, 13, 1);
        state.place(Player::Two, 7, 2);
        state.place(Player::Two, 2, 2);
        let moves = generate(&state, roll(6, 5), Player::One, &[]).unwrap();
        // Neither order uses both dice; the higher die rule forces the 6,
        // but 13/7 is blocked so only the 5 can be played.
        assert_eq!(descriptions(&moves), vec!["13/8"]);
    }

    #[test]
    fn higher_die_rule() {
        // A lone checker on 8: 8/2 and 8/7 are both legal, but the 1 and 6
        // points are blocked so neither can be followed by the other die.
        let mut state = BoardState::empty(Player::One);
        state.place(Player::One, 8, 1);
        state.place(Player::Two, 1, 2);
        state.place(Player::Two, 6, 2);
        let moves = generate(&state, roll(1, 6), Player::One, &[]).unwrap();
        assert_eq!(descriptions(&moves), vec!["8/2"]);
        assert_eq!(moves[0].mv.dice_used, vec![6]);
    }

    #[test]
    fn prefix_is_respected() {
        let state = BoardState::starting(Player::One);
        let prefix = [SubMove::new(13, 7)];
        let moves = generate(&state, roll(6, 6), Player::One, &prefix).unwrap();
        assert!(!moves.is_empty());
        for m in &moves {
            assert_eq!(m.mv.submoves[0].from, 13);
            assert_eq!(m.mv.submoves[0].to, 7);
            assert_eq!(m.mv.submoves.len(), 4);
        }
        // Without the prefix there are moves that leave 13 untouched.
        let all = generate(&state, roll(6, 6), Player::One, &[]).unwrap();
        assert!(all.len() > moves.len());
    }

    #[test]
    fn prefix_consuming_all_dice_returns_itself() {
        let state = BoardState::starting(Player::One);
        let prefix = [SubMove::new(24, 18), SubMove::new(13, 8)];
        let moves = generate(&state, roll(6, 5), Player::One, &prefix).unwrap();
        assert_eq!(descriptions(&moves), vec!["24/18 13/8"]);
    }

    #[test]
    fn illegal_prefix_is_rejected() {
        let state = BoardState::starting(Player::One);
        let err = generate(&state, roll(6, 5), Player::One, &[SubMove::new(24, 20)]).unwrap_err();
        assert!(matches!(err, MoveGenError::IllegalPrefix { .. }));
        let err = generate(
            &state,
            roll(6, 5),
            Player::One,
            &[SubMove::new(24, 18), SubMove::new(13, 8), SubMove::new(8, 2)],
        )
        .unwrap_err();
        assert_eq!(err, MoveGenError::PrefixTooLong);
    }

    #[test]
    fn bear_off_with_larger_die() {
        let mut state = BoardState::empty(Player::Two);
        state.place(Player::Two, Player::Two.to_absolute(2), 1);
        state.place(Player::Two, Player::Two.to_absolute(1), 1);
        let moves = generate(&state, roll(6, 5), Player::Two, &[]).unwrap();
        assert_eq!(descriptions(&moves), vec!["2/off 1/off"]);
        assert_eq!(moves[0].board.off[Player::Two.index()], 15);
    }

    #[test]
    fn entering_then_moving() {
        let mut state = BoardState::starting(Player::One);
        state.points[5] = Some((Player::One, 4));
        state.bar[0] = 1;
        let moves = generate(&state, roll(3, 1), Player::One, &[]).unwrap();
        assert!(!moves.is_empty());
        for m in &moves {
            assert!(m.mv.submoves.iter().any(|s| s.from == BAR));
            assert_eq!(m.board.bar[0], 0);
        }
    }

    #[test]
    fn player_two_moves_mirror_player_one() {
        let one = generate(&BoardState::starting(Player::One), roll(4, 2), Player::One, &[]).unwrap();
        let two = generate(&BoardState::starting(Player::Two), roll(4, 2), Player::Two, &[]).unwrap();
        assert_eq!(descriptions(&one), descriptions(&two));
        assert!(two.iter().all(|m| m.board.validate().is_ok()));
    }

    #[test]
    fn result_passes_turn_to_movers_opponent() {
        // The turn field says player one, but player two is the one moving.
        let state = BoardState::starting(Player::One);
        let moves = generate(&state, roll(6, 5), Player::Two, &[]).unwrap();
        assert!(!moves.is_empty());
        assert!(moves.iter().all(|m| m.board.turn == Player::One));
    }

    #[test]
    fn hits_are_tagged() {
        let mut state = BoardState::empty(Player::One);
        state.place(Player::One, 13, 1);
        state.place(Player::Two, 8, 1);
        state.place(Player::Two, 24, 1);
        let moves = generate(&state, roll(5, 3), Player::One, &[]).unwrap();
        let hit = moves
            .iter()
            .find(|m| m.description == "13/8* 8/5")
            .expect("hitting play");
        assert!(hit.mv.is_hit());
        assert_eq!(hit.board.bar[Player::Two.index()], 1);
    }
}
