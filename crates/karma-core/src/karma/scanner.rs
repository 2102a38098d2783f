//! Token scanner.
//!
//! Finds `++` / `--` tokens in a chat line and works out which object each
//! one applies to. The message is treated as a fixed sequence of `char`s;
//! every position is judged against the original text, so overlapping and
//! adjacent tokens are all considered independently.
//!
//! Two extraction modes exist:
//!
//! - plain-word: `rust++`, the object is the run of letters, digits, `-` and
//!   `_` before the token, and must start the message or follow whitespace.
//! - bracketed: `[some thing]++` or `(some thing)--`, the object is whatever
//!   sits between the innermost enclosing delimiters.

use serde::{Deserialize, Serialize};

use crate::types::Sign;

/// Delimiter pair used by a bracketed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bracket {
    /// `[...]`, announces the change in the channel.
    Square,
    /// `(...)`, changes karma quietly.
    Round,
}

impl Bracket {
    /// The bracket closed by `c`, if `c` is a closing delimiter.
    pub fn closed_by(c: char) -> Option<Self> {
        match c {
            ']' => Some(Self::Square),
            ')' => Some(Self::Round),
            _ => None,
        }
    }

    pub fn open(&self) -> char {
        match self {
            Self::Square => '[',
            Self::Round => '(',
        }
    }

    pub fn close(&self) -> char {
        match self {
            Self::Square => ']',
            Self::Round => ')',
        }
    }
}

/// How the object of a hit was delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extraction {
    Plain,
    Bracketed(Bracket),
}

impl Extraction {
    /// Whether a change made through this form is announced in the channel.
    pub fn is_verbose(&self) -> bool {
        matches!(self, Self::Bracketed(Bracket::Square))
    }
}

/// A word-terminated `++` or `--` at a character offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub position: usize,
    pub sign: Sign,
}

/// A validated token together with the object it applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Character offset of the first `+`/`-` of the token.
    pub position: usize,
    pub sign: Sign,
    /// Object name as typed.
    pub object: String,
    pub extraction: Extraction,
}

/// Scan a message for karma changes, in ascending position order.
pub fn scan(message: &str) -> Vec<Hit> {
    let chars: Vec<char> = message.chars().collect();
    find_tokens(&chars)
        .into_iter()
        .filter_map(|token| {
            extract_object(&chars, token.position).map(|(object, extraction)| Hit {
                position: token.position,
                sign: token.sign,
                object,
                extraction,
            })
        })
        .collect()
}

/// Find every word-terminated `++`/`--`.
///
/// Only positions `1..=len-2` are examined, so a token never starts the
/// message and always has a character before it.
pub fn find_tokens(chars: &[char]) -> Vec<Token> {
    let len = chars.len();
    if len < 3 {
        return Vec::new();
    }

    (1..len - 1)
        .filter_map(|i| {
            let sign = match (chars[i], chars[i + 1]) {
                ('+', '+') => Sign::Increase,
                ('-', '-') => Sign::Decrease,
                _ => return None,
            };
            let terminated = chars.get(i + 2).map_or(true, |&c| is_terminator(c));
            terminated.then_some(Token { position: i, sign })
        })
        .collect()
}

/// Work out the object for the token at `position`. `None` means the token
/// does not count.
pub fn extract_object(chars: &[char], position: usize) -> Option<(String, Extraction)> {
    let before = *chars.get(position.checked_sub(1)?)?;
    if before.is_alphabetic() {
        return extract_plain(chars, position);
    }
    let bracket = Bracket::closed_by(before)?;
    extract_bracketed(chars, position, bracket)
}

fn extract_plain(chars: &[char], position: usize) -> Option<(String, Extraction)> {
    let boundary = chars[..position]
        .iter()
        .rposition(|&c| !is_word_char(c))
        .map_or(0, |i| i + 1);

    // Glued onto something bigger, like a URL or `3+a++`.
    if boundary > 0 && !chars[boundary - 1].is_whitespace() {
        return None;
    }

    let object: String = chars[boundary..position].iter().collect();
    Some((object, Extraction::Plain))
}

fn extract_bracketed(
    chars: &[char],
    position: usize,
    bracket: Bracket,
) -> Option<(String, Extraction)> {
    let close_at = position - 1;
    let open_at = chars[..position].iter().rposition(|&c| c == bracket.open())?;

    // The first closer after the opener must be the one touching the token,
    // otherwise the pair was already closed before it (`[a] b]++`).
    let first_close = chars[open_at..]
        .iter()
        .position(|&c| c == bracket.close())
        .map(|i| open_at + i);
    if first_close != Some(close_at) {
        return None;
    }

    // Taken verbatim; `[]++` votes for the empty object.
    let object: String = chars[open_at + 1..close_at].iter().collect();
    Some((object, Extraction::Bracketed(bracket)))
}

fn is_terminator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':')
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c.is_numeric() || c == '-' || c == '_'
}
