//! Game Events
//!
//! Events produced by session transitions, consumed by the network layer
//! for player notices and by logging.

use serde::{Serialize, Deserialize};
use crate::game::difficulty::Difficulty;
use crate::game::evaluate::GuessOutcome;
use crate::game::parse::GuessError;

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A new game began with a freshly drawn secret.
    GameStarted {
        difficulty: Difficulty,
        low: i64,
        high: i64,
        attempt_limit: u32,
    },

    /// A guess could not be parsed. The attempt still counts.
    GuessRejected {
        raw: Option<String>,
        error: GuessError,
    },

    /// A parsed guess was compared with the secret.
    GuessEvaluated {
        guess: i64,
        outcome: GuessOutcome,
        hint: String,
    },

    /// The secret was found.
    GameWon {
        secret: i64,
        attempts: u32,
        score: f64,
    },

    /// The attempt limit was exceeded.
    GameLost {
        secret: i64,
        attempts: u32,
        score: f64,
    },
}

/// A game event tagged with the game and attempt it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Game counter within the session.
    pub game_number: u32,

    /// Attempt count when the event occurred (0 before the first guess).
    pub attempt: u32,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(game_number: u32, attempt: u32, data: GameEventData) -> Self {
        Self { game_number, attempt, data }
    }

    /// Create game started event.
    pub fn game_started(game_number: u32, difficulty: Difficulty) -> Self {
        let (low, high) = difficulty.range();
        Self::new(
            game_number,
            0,
            GameEventData::GameStarted {
                difficulty,
                low,
                high,
                attempt_limit: difficulty.attempt_limit(),
            },
        )
    }

    /// Create guess rejected event.
    pub fn guess_rejected(game_number: u32, attempt: u32, raw: Option<&str>, error: GuessError) -> Self {
        Self::new(
            game_number,
            attempt,
            GameEventData::GuessRejected {
                raw: raw.map(str::to_owned),
                error,
            },
        )
    }

    /// Create guess evaluated event.
    pub fn guess_evaluated(game_number: u32, attempt: u32, guess: i64, outcome: GuessOutcome) -> Self {
        Self::new(
            game_number,
            attempt,
            GameEventData::GuessEvaluated {
                guess,
                outcome,
                hint: outcome.hint().to_owned(),
            },
        )
    }

    /// Create game won event.
    pub fn game_won(game_number: u32, attempts: u32, secret: i64, score: f64) -> Self {
        Self::new(game_number, attempts, GameEventData::GameWon { secret, attempts, score })
    }

    /// Create game lost event.
    pub fn game_lost(game_number: u32, attempts: u32, secret: i64, score: f64) -> Self {
        Self::new(game_number, attempts, GameEventData::GameLost { secret, attempts, score })
    }

    /// Whether this event ends the game.
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::GameWon { .. } | GameEventData::GameLost { .. })
    }

    /// Player-facing text for the event.
    pub fn message(&self) -> String {
        match &self.data {
            GameEventData::GameStarted { low, high, .. } => {
                format!("New game started. Guess a number between {low} and {high}.")
            }
            GameEventData::GuessRejected { error, .. } => error.to_string(),
            GameEventData::GuessEvaluated { hint, .. } => hint.clone(),
            GameEventData::GameWon { secret, score, .. } => {
                format!("You won! The secret was {secret}. Final score: {score}")
            }
            GameEventData::GameLost { secret, score, .. } => {
                format!("Out of attempts! The secret was {secret}. Score: {score}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_events() {
        assert!(GameEvent::game_won(1, 3, 42, 66.0).is_terminal());
        assert!(GameEvent::game_lost(1, 7, 42, 0.0).is_terminal());
        assert!(!GameEvent::guess_evaluated(1, 2, 10, GuessOutcome::TooLow).is_terminal());
        assert!(!GameEvent::game_started(1, Difficulty::Easy).is_terminal());
    }

    #[test]
    fn test_messages() {
        let started = GameEvent::game_started(2, Difficulty::Normal);
        assert_eq!(started.message(), "New game started. Guess a number between 1 and 50.");

        let rejected = GameEvent::guess_rejected(2, 1, Some("abc"), GuessError::NotANumber);
        assert_eq!(rejected.message(), "That is not a number.");

        let lower = GameEvent::guess_evaluated(2, 2, 90, GuessOutcome::TooHigh);
        assert_eq!(lower.message(), "📉 Go LOWER!");

        let won = GameEvent::game_won(2, 1, 7, 100.0);
        assert_eq!(won.message(), "You won! The secret was 7. Final score: 100");

        let lost = GameEvent::game_lost(2, 9, 7, 0.0);
        assert!(lost.message().starts_with("Out of attempts! The secret was 7."));
    }

    #[test]
    fn test_game_started_carries_config() {
        let event = GameEvent::game_started(1, Difficulty::Hard);
        assert_eq!(
            event.data,
            GameEventData::GameStarted { difficulty: Difficulty::Hard, low: 1, high: 100, attempt_limit: 6 }
        );
    }
}
