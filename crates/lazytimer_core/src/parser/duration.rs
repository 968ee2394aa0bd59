//! Duration spec parsing for single-line timer input.
//!
//! # Responsibility
//! - Split `<digits>[unit] [label]` into a duration and a display label.
//! - Reject malformed specs with a typed `ParseError`.
//!
//! # Invariants
//! - The spec token must match in full; `10x` is rejected, not read as `10`.
//! - A trailing `-` marker belongs to the UI layer and is stripped here.
//! - Parsing never panics and never touches shared state.

use crate::model::timer::DEFAULT_TIMER_LABEL;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// UI designator for "minimize after creating this timer".
pub const TRAILING_MARKER: char = '-';

static SPEC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)([sSmMhHdD]?)$").expect("valid duration spec regex"));

/// Parsed timer request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSpec {
    pub duration_secs: u64,
    pub label: String,
}

impl TimerSpec {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// Rejection reasons for timer input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    EmptyInput,
    InvalidSpec(String),
    Overflow(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "timer input is empty"),
            Self::InvalidSpec(token) => write!(
                f,
                "invalid duration `{token}`; expected digits with optional s|m|h|d unit"
            ),
            Self::Overflow(token) => write!(f, "duration `{token}` is too large"),
        }
    }
}

impl Error for ParseError {}

/// Parses one input line into a timer request.
///
/// # Contract
/// - Leading/trailing whitespace is ignored.
/// - One trailing `-` marker is stripped before parsing.
/// - Digits without a unit are seconds; units are case-insensitive.
/// - Missing label yields `DEFAULT_TIMER_LABEL`.
///
/// # Errors
/// - `EmptyInput` when nothing but whitespace (or the marker) remains.
/// - `InvalidSpec` when the first token is not `<digits>[smhd]`.
/// - `Overflow` when the duration does not fit in `u64` seconds.
pub fn parse_timer_input(input: &str) -> Result<TimerSpec, ParseError> {
    let trimmed = strip_trailing_marker(input.trim()).trim();
    if trimmed.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let (token, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim_start()),
        None => (trimmed, ""),
    };

    let duration_secs = parse_spec_token(token)?;
    let label = if rest.is_empty() {
        DEFAULT_TIMER_LABEL.to_string()
    } else {
        rest.to_string()
    };

    Ok(TimerSpec {
        duration_secs,
        label,
    })
}

/// Parses a bare spec token such as `90`, `5m` or `2H`.
pub fn parse_spec_token(token: &str) -> Result<u64, ParseError> {
    let Some(captures) = SPEC_RE.captures(token) else {
        return Err(ParseError::InvalidSpec(token.to_string()));
    };

    let amount = captures[1]
        .parse::<u64>()
        .map_err(|_| ParseError::Overflow(token.to_string()))?;
    let multiplier = unit_multiplier(&captures[2]);
    amount
        .checked_mul(multiplier)
        .ok_or_else(|| ParseError::Overflow(token.to_string()))
}

/// Removes a single trailing marker if present.
pub fn strip_trailing_marker(input: &str) -> &str {
    input.strip_suffix(TRAILING_MARKER).unwrap_or(input)
}

fn unit_multiplier(unit: &str) -> u64 {
    match unit.to_ascii_lowercase().as_str() {
        "m" => 60,
        "h" => 3_600,
        "d" => 86_400,
        // Empty unit and `s` are both seconds; the regex admits nothing else.
        _ => 1,
    }
}
