//! Move notation encoding and decoding.
//!
//! A submove is written `from/to` in the mover's own point numbering, with
//! `bar` and `off` for the bar and the bear-off tray and a trailing `*` for
//! a hit: `bar/22`, `13/8`, `6/1*`, `4/off`. A full move lists its submoves
//! sorted by origin then destination, both descending, and collapses
//! repeated identical submoves as `8/5(2)`. A forced pass is `pass`.

use thiserror::Error;

use crate::board::moves::{SubMove, BAR, OFF};

/// Errors that can occur when parsing move notation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotationError {
    #[error("empty input")]
    EmptyInput,

    #[error("expected 'from/to', got '{0}'")]
    MissingSeparator(String),

    #[error("invalid origin '{0}'")]
    InvalidOrigin(String),

    #[error("invalid destination '{0}'")]
    InvalidDestination(String),

    #[error("submove '{0}' does not move toward home")]
    WrongDirection(String),
}

/// Parses a single submove such as `24/18`, `bar/20*` or `3/off`.
///
/// The hit marker is accepted but not trusted: callers recompute hits
/// against the board.
pub fn parse_submove(s: &str) -> Result<SubMove, NotationError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(NotationError::EmptyInput);
    }

    let (body, hit) = match s.strip_suffix('*') {
        Some(b) => (b, true),
        None => (s, false),
    };
    let (from_str, to_str) = body
        .split_once('/')
        .ok_or_else(|| NotationError::MissingSeparator(s.to_string()))?;

    let from = match from_str.to_ascii_lowercase().as_str() {
        "bar" => BAR,
        other => parse_point(other).ok_or_else(|| NotationError::InvalidOrigin(from_str.to_string()))?,
    };
    let to = match to_str.to_ascii_lowercase().as_str() {
        "off" => OFF,
        other => {
            parse_point(other).ok_or_else(|| NotationError::InvalidDestination(to_str.to_string()))?
        }
    };

    if to >= from {
        return Err(NotationError::WrongDirection(s.to_string()));
    }

    Ok(SubMove { from, to, hit })
}

/// Parses a list of submove strings, in order.
pub fn parse_submoves<S: AsRef<str>>(items: &[S]) -> Result<Vec<SubMove>, NotationError> {
    items.iter().map(|s| parse_submove(s.as_ref())).collect()
}

fn parse_point(s: &str) -> Option<u8> {
    let n: u8 = s.parse().ok()?;
    (1..=24).contains(&n).then_some(n)
}

fn format_point(p: u8, is_origin: bool) -> String {
    match p {
        BAR if is_origin => "bar".to_string(),
        OFF if !is_origin => "off".to_string(),
        n => n.to_string(),
    }
}

/// Formats a single submove.
pub fn format_submove(sub: &SubMove) -> String {
    format!(
        "{}/{}{}",
        format_point(sub.from, true),
        format_point(sub.to, false),
        if sub.hit { "*" } else { "" }
    )
}

/// Formats a move's submoves in canonical order.
///
/// The result does not depend on the order the submoves were played, so it
/// can serve as a stable tie-break key.
pub fn format_move(submoves: &[SubMove]) -> String {
    if submoves.is_empty() {
        return "pass".to_string();
    }

    let mut sorted = submoves.to_vec();
    sorted.sort_by(|a, b| {
        b.from
            .cmp(&a.from)
            .then(b.to.cmp(&a.to))
            .then(b.hit.cmp(&a.hit))
    });

    let mut parts: Vec<String> = Vec::with_capacity(sorted.len());
    let mut i = 0;
    while i < sorted.len() {
        let mut run = 1;
        while i + run < sorted.len() && sorted[i + run] == sorted[i] {
            run += 1;
        }
        let text = format_submove(&sorted[i]);
        if run > 1 {
            parts.push(format!("{}({})", text, run));
        } else {
            parts.push(text);
        }
        i += run;
    }
    parts.join(" ")
}
