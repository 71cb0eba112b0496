//! Guess evaluation.

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};

/// Hint shown for a correct guess.
pub const HINT_CORRECT: &str = "🎉 Correct!";
/// Hint shown when the guess is above the secret.
pub const HINT_LOWER: &str = "📉 Go LOWER!";
/// Hint shown when the guess is below the secret.
pub const HINT_HIGHER: &str = "📈 Go HIGHER!";

/// Result of comparing a guess against the secret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessOutcome {
    /// The guess matches the secret.
    Win,
    /// The guess is above the secret.
    TooHigh,
    /// The guess is below the secret.
    TooLow,
}

impl GuessOutcome {
    /// Outcome for `guess.cmp(secret)`.
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Equal => GuessOutcome::Win,
            Ordering::Greater => GuessOutcome::TooHigh,
            Ordering::Less => GuessOutcome::TooLow,
        }
    }

    /// Directional hint for the player.
    pub const fn hint(self) -> &'static str {
        match self {
            GuessOutcome::Win => HINT_CORRECT,
            GuessOutcome::TooHigh => HINT_LOWER,
            GuessOutcome::TooLow => HINT_HIGHER,
        }
    }

    /// Whether this outcome ends the game as a win.
    pub const fn is_win(self) -> bool {
        matches!(self, GuessOutcome::Win)
    }
}

/// Outcome paired with its hint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
    /// Comparison result.
    pub outcome: GuessOutcome,
    /// Human-readable hint.
    pub hint: &'static str,
}

impl From<GuessOutcome> for Evaluation {
    fn from(outcome: GuessOutcome) -> Self {
        Self { outcome, hint: outcome.hint() }
    }
}

/// Compare a guess to the secret.
pub fn evaluate(guess: i64, secret: i64) -> Evaluation {
    GuessOutcome::from_ordering(guess.cmp(&secret)).into()
}

/// Compare a guess to a secret held as text.
///
/// Uses the lexicographic order of the guess's decimal form, so `"9"` sorts
/// above `"50"`. Only meaningful for secrets that arrive as strings from
/// outside the game model.
pub fn evaluate_text(guess: i64, secret: &str) -> Evaluation {
    GuessOutcome::from_ordering(guess.to_string().as_str().cmp(secret)).into()
}
