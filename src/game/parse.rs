//! Guess parsing.
//!
//! Turns the raw text of the guess box into an integer. Text containing a
//! decimal point is read as a float and truncated toward zero.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::debug;

/// Reasons a raw guess is rejected.
///
/// Both are recoverable: the player sees the message and the attempt is
/// still counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessError {
    /// Nothing was entered.
    #[error("Enter a guess.")]
    EmptyInput,
    /// The text is not a number.
    #[error("That is not a number.")]
    NotANumber,
}

/// Parse a raw guess.
pub fn parse_guess(raw: Option<&str>) -> Result<i64, GuessError> {
    let raw = match raw {
        None | Some("") => return Err(GuessError::EmptyInput),
        Some(raw) => raw,
    };

    let trimmed = raw.trim();
    let parsed = if trimmed.contains('.') {
        trimmed.parse::<f64>().ok().and_then(truncate_to_i64)
    } else {
        trimmed.parse::<i64>().ok()
    };

    parsed.ok_or_else(|| {
        debug!("Rejected guess `{}` (length {})", raw, raw.len());
        GuessError::NotANumber
    })
}

/// Truncate toward zero, refusing values with no integer counterpart.
fn truncate_to_i64(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    let truncated = value.trunc();
    if !truncated.is_finite() || truncated < -BOUND || truncated >= BOUND {
        return None;
    }
    Some(truncated as i64)
}
