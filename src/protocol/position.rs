//! Position notation encoding and decoding.
//!
//! The notation is a single line of ten colon-separated fields:
//!
//! `<board>:<cube>:<cube owner>:<turn>:<dice>:<score 1>:<score 2>:<crawford/jacoby>:<match length>:<max cube>`
//!
//! The board field has 26 characters. Index 0 is player two's bar, indices
//! 1..=24 are points 1..=24 numbered from player one's side, and index 25 is
//! player one's bar. `-` is an empty point, `A`..`O` are 1..15 checkers of
//! player one and `a`..`o` are 1..15 checkers of player two. Borne-off
//! counts are implied by what is missing from the board.
//!
//! The cube and max-cube fields are exponents of two. Cube owner and turn
//! use `1` for player one, `-1` for player two, and (owner only) `0` for a
//! centred cube. Dice are `00` before the roll, two digits once rolled, or
//! one of `D`, `B`, `R` while a double is pending.

use crate::board::dice::{DiceField, DiceRoll};
use crate::board::player::{Player, CHECKERS_PER_SIDE, POINT_COUNT};
use crate::board::state::{BoardState, Cube};

/// Number of colon-separated fields.
pub const FIELD_COUNT: usize = 10;

/// Length of the board field.
pub const BOARD_FIELD_LEN: usize = POINT_COUNT + 2;

/// Errors that can occur while decoding position notation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("expected {FIELD_COUNT} fields separated by ':', got {0}")]
    WrongFieldCount(usize),

    #[error("board field must be {BOARD_FIELD_LEN} characters, got {0}")]
    WrongBoardLength(usize),

    #[error("unrecognized board symbol '{symbol}' at index {index}")]
    InvalidSymbol { index: usize, symbol: char },

    #[error("bar slot at index {index} holds the wrong side's checkers: '{symbol}'")]
    WrongBarOwner { index: usize, symbol: char },

    #[error("player {player} has {count} checkers on the board, more than 15")]
    TooManyCheckers { player: u8, count: u32 },

    #[error("invalid {field} field: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid cube owner: '{0}'")]
    InvalidCubeOwner(String),

    #[error("invalid turn: '{0}'")]
    InvalidTurn(String),

    #[error("invalid dice field: '{0}'")]
    InvalidDice(String),

    #[error("invalid crawford/jacoby flag: '{0}'")]
    InvalidFlag(String),
}

/// Parses a board symbol into its owner and count. '-' yields None.
fn parse_symbol(c: char) -> Option<Option<(Player, u8)>> {
    match c {
        '-' => Some(None),
        'A'..='O' => Some(Some((Player::One, c as u8 - b'A' + 1))),
        'a'..='o' => Some(Some((Player::Two, c as u8 - b'a' + 1))),
        _ => None,
    }
}

/// Formats an owner and count as a board symbol.
fn format_symbol(slot: Option<(Player, u8)>) -> char {
    match slot {
        None => '-',
        Some((Player::One, n)) => (b'A' + n - 1) as char,
        Some((Player::Two, n)) => (b'a' + n - 1) as char,
    }
}

/// Parses a canonical non-negative decimal integer. Signs and leading
/// zeros are rejected so that encoding reproduces the input exactly.
fn parse_number<T: std::str::FromStr + ToString>(
    field: &'static str,
    s: &str,
) -> Result<T, PositionError> {
    let err = || PositionError::InvalidNumber {
        field,
        value: s.to_string(),
    };
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let n: T = s.parse().map_err(|_| err())?;
    if n.to_string() != s {
        return Err(err());
    }
    Ok(n)
}

/// Parses the board field into points and bar counts, deriving off counts.
fn parse_board(s: &str, state: &mut BoardState) -> Result<(), PositionError> {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() != BOARD_FIELD_LEN {
        return Err(PositionError::WrongBoardLength(chars.len()));
    }

    let mut counts = [0u32; 2];
    for (index, &symbol) in chars.iter().enumerate() {
        let slot = parse_symbol(symbol).ok_or(PositionError::InvalidSymbol { index, symbol })?;
        match index {
            0 | 25 => {
                let bar_owner = if index == 0 { Player::Two } else { Player::One };
                if let Some((owner, n)) = slot {
                    if owner != bar_owner {
                        return Err(PositionError::WrongBarOwner { index, symbol });
                    }
                    state.bar[owner.index()] = n;
                    counts[owner.index()] += n as u32;
                }
            }
            _ => {
                state.points[index - 1] = slot;
                if let Some((owner, n)) = slot {
                    counts[owner.index()] += n as u32;
                }
            }
        }
    }

    for player in [Player::One, Player::Two] {
        let count = counts[player.index()];
        if count > CHECKERS_PER_SIDE as u32 {
            return Err(PositionError::TooManyCheckers {
                player: player.number(),
                count,
            });
        }
        state.off[player.index()] = CHECKERS_PER_SIDE - count as u8;
    }
    Ok(())
}

/// Parses a signed side field: `1` or `-1`, plus `0` when `allow_none`.
fn parse_side(s: &str, allow_none: bool) -> Option<Option<Player>> {
    match s {
        "1" => Some(Some(Player::One)),
        "-1" => Some(Some(Player::Two)),
        "0" if allow_none => Some(None),
        _ => None,
    }
}

fn parse_dice(s: &str) -> Result<DiceField, PositionError> {
    let invalid = || PositionError::InvalidDice(s.to_string());
    match s {
        "00" => Ok(DiceField::Pending),
        "D" => Ok(DiceField::Doubled),
        "B" => Ok(DiceField::Beavered),
        "R" => Ok(DiceField::Raccooned),
        _ => {
            let b = s.as_bytes();
            if b.len() != 2 || !b.iter().all(u8::is_ascii_digit) {
                return Err(invalid());
            }
            DiceRoll::new(b[0] - b'0', b[1] - b'0')
                .map(DiceField::Rolled)
                .ok_or_else(invalid)
        }
    }
}

fn format_dice(dice: DiceField) -> String {
    match dice {
        DiceField::Pending => "00".to_string(),
        DiceField::Rolled(r) => format!("{}{}", r.first(), r.second()),
        DiceField::Doubled => "D".to_string(),
        DiceField::Beavered => "B".to_string(),
        DiceField::Raccooned => "R".to_string(),
    }
}

/// Decodes position notation into a board state.
///
/// Never clamps: any malformed field is an error.
pub fn decode(text: &str) -> Result<BoardState, PositionError> {
    let fields: Vec<&str> = text.split(':').collect();
    if fields.len() != FIELD_COUNT {
        return Err(PositionError::WrongFieldCount(fields.len()));
    }

    let turn = parse_side(fields[3], false)
        .flatten()
        .ok_or_else(|| PositionError::InvalidTurn(fields[3].to_string()))?;
    let mut state = BoardState::empty(turn);

    parse_board(fields[0], &mut state)?;

    state.cube = Cube {
        exponent: parse_number("cube", fields[1])?,
        owner: parse_side(fields[2], true)
            .ok_or_else(|| PositionError::InvalidCubeOwner(fields[2].to_string()))?,
    };
    state.dice = parse_dice(fields[4])?;
    state.score = [
        parse_number("score", fields[5])?,
        parse_number("score", fields[6])?,
    ];
    state.crawford_jacoby = match fields[7] {
        "0" => false,
        "1" => true,
        other => return Err(PositionError::InvalidFlag(other.to_string())),
    };
    state.match_length = parse_number("match length", fields[8])?;
    state.max_cube_exponent = parse_number("max cube", fields[9])?;

    Ok(state)
}

/// Encodes a board state as position notation.
pub fn encode(state: &BoardState) -> String {
    let mut board = String::with_capacity(BOARD_FIELD_LEN);
    board.push(bar_symbol(state, Player::Two));
    for slot in state.points.iter() {
        board.push(format_symbol(*slot));
    }
    board.push(bar_symbol(state, Player::One));

    let owner = match state.cube.owner {
        Some(p) => p.sign(),
        None => 0,
    };

    format!(
        "{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        board,
        state.cube.exponent,
        owner,
        state.turn.sign(),
        format_dice(state.dice),
        state.score[0],
        state.score[1],
        u8::from(state.crawford_jacoby),
        state.match_length,
        state.max_cube_exponent,
    )
}

fn bar_symbol(state: &BoardState, player: Player) -> char {
    match state.bar[player.index()] {
        0 => '-',
        n => format_symbol(Some((player, n))),
    }
}
