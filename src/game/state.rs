//! Game State Definitions
//!
//! The per-session game state machine. A [`GameSession`] is an owned value:
//! every transition takes `&mut self` and reports what happened through the
//! returned [`GameEvent`]s, and [`GameSession::view`] builds the payload a
//! client renders.

use serde::{Serialize, Deserialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::rng::SecretRng;
use crate::game::difficulty::Difficulty;
use crate::game::evaluate::evaluate;
use crate::game::events::GameEvent;
use crate::game::parse::parse_guess;
use crate::game::score::score_for;

// =============================================================================
// STATUS & HISTORY
// =============================================================================

/// Game status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Accepting guesses.
    Playing,
    /// Secret found. Terminal.
    Won,
    /// Attempts exhausted. Terminal.
    Lost,
}

impl GameStatus {
    /// Whether no further guesses are accepted.
    pub const fn is_over(self) -> bool {
        !matches!(self, GameStatus::Playing)
    }
}

/// One submitted guess, as recorded in the history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    /// A guess that parsed to a number.
    Number(i64),
    /// Raw text that failed to parse (`None` when nothing was submitted).
    Invalid(Option<String>),
}

// =============================================================================
// ERRORS
// =============================================================================

/// Errors from session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The game already ended; a new game must be started.
    #[error("game is over ({status:?})")]
    GameOver {
        /// Terminal status of the finished game.
        status: GameStatus,
    },
}

impl SessionError {
    /// Text shown to the player.
    pub fn player_message(&self) -> &'static str {
        match self {
            SessionError::GameOver { status: GameStatus::Won } => {
                "You already won. Start a new game to play again."
            }
            SessionError::GameOver { .. } => "Game over. Start a new game to try again.",
        }
    }
}

// =============================================================================
// GAME SESSION
// =============================================================================

/// State of one player's game.
#[derive(Clone, Debug)]
pub struct GameSession {
    difficulty: Difficulty,
    secret: i64,
    attempts: u32,
    score: f64,
    status: GameStatus,
    history: Vec<HistoryEntry>,
    game_number: u32,
    last_hint: Option<&'static str>,
}

impl GameSession {
    /// Start the first game of a session.
    pub fn new(difficulty: Difficulty, rng: &mut SecretRng) -> Self {
        let (low, high) = difficulty.range();
        Self::with_secret(difficulty, rng.next_in_range(low, high))
    }

    /// Start a game with a known secret.
    pub fn with_secret(difficulty: Difficulty, secret: i64) -> Self {
        Self {
            difficulty,
            secret,
            attempts: 0,
            score: 0.0,
            status: GameStatus::Playing,
            history: Vec::new(),
            game_number: 1,
            last_hint: None,
        }
    }

    /// Replace the current game with a fresh one.
    pub fn start_new_game(&mut self, difficulty: Difficulty, rng: &mut SecretRng) -> GameEvent {
        let (low, high) = difficulty.range();
        let secret = rng.next_in_range(low, high);
        self.restart_with_secret(difficulty, secret)
    }

    /// Replace the current game with one whose secret is known.
    pub fn restart_with_secret(&mut self, difficulty: Difficulty, secret: i64) -> GameEvent {
        let game_number = self.game_number.wrapping_add(1);
        *self = Self {
            game_number,
            ..Self::with_secret(difficulty, secret)
        };

        info!("Game #{} started on {} ({} attempts)", game_number, difficulty, difficulty.attempt_limit());
        GameEvent::game_started(game_number, difficulty)
    }

    /// Switch difficulty, restarting the game if it differs from the current one.
    pub fn change_difficulty(&mut self, difficulty: Difficulty, rng: &mut SecretRng) -> Option<GameEvent> {
        if difficulty == self.difficulty {
            return None;
        }
        debug!("Difficulty changed {} -> {}", self.difficulty, difficulty);
        Some(self.start_new_game(difficulty, rng))
    }

    /// Submit a raw guess.
    ///
    /// Every submission counts as an attempt, including ones that fail to
    /// parse. `show_hint` controls whether the hint of a valid guess is kept
    /// for display.
    pub fn submit_guess(&mut self, raw: Option<&str>, show_hint: bool) -> Result<Vec<GameEvent>, SessionError> {
        if self.status.is_over() {
            return Err(SessionError::GameOver { status: self.status });
        }

        self.attempts += 1;
        let attempt = self.attempts;

        let guess = match parse_guess(raw) {
            Ok(guess) => guess,
            Err(error) => {
                self.history.push(HistoryEntry::Invalid(raw.map(str::to_owned)));
                debug!("Attempt {} rejected: {}", attempt, error);
                return Ok(vec![GameEvent::guess_rejected(self.game_number, attempt, raw, error)]);
            }
        };

        self.history.push(HistoryEntry::Number(guess));

        let evaluation = evaluate(guess, self.secret);
        self.last_hint = show_hint.then_some(evaluation.hint);
        self.score = score_for(self.score, evaluation.outcome, attempt, self.attempt_limit());

        let mut events = vec![GameEvent::guess_evaluated(self.game_number, attempt, guess, evaluation.outcome)];

        if evaluation.outcome.is_win() {
            self.status = GameStatus::Won;
            info!("Game #{} won in {} attempts, score {}", self.game_number, attempt, self.score);
            events.push(GameEvent::game_won(self.game_number, attempt, self.secret, self.score));
        } else if attempt > self.attempt_limit() {
            self.status = GameStatus::Lost;
            info!("Game #{} lost after {} attempts", self.game_number, attempt);
            events.push(GameEvent::game_lost(self.game_number, attempt, self.secret, self.score));
        }

        Ok(events)
    }

    /// Current difficulty.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Attempt limit of the current difficulty.
    pub fn attempt_limit(&self) -> u32 {
        self.difficulty.attempt_limit()
    }

    /// Guesses submitted in this game.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// `attempt_limit - attempts`, floored at zero.
    pub fn attempts_remaining(&self) -> u32 {
        self.attempt_limit().saturating_sub(self.attempts)
    }

    /// Running score.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Guesses in submission order.
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Counter of games played in this session, starting at 1.
    pub fn game_number(&self) -> u32 {
        self.game_number
    }

    /// Hint of the latest valid guess, if hints were enabled for it.
    pub fn last_hint(&self) -> Option<&'static str> {
        self.last_hint
    }

    /// The secret, only once the game has ended.
    pub fn revealed_secret(&self) -> Option<i64> {
        self.status.is_over().then_some(self.secret)
    }

    /// Build the render payload. `show_hint` is the caller's hint toggle,
    /// reported back so a client can restore its control.
    pub fn view(&self, show_hint: bool) -> GameView {
        let (low, high) = self.difficulty.range();
        GameView {
            game_number: self.game_number,
            difficulty: self.difficulty,
            low,
            high,
            attempt_limit: self.attempt_limit(),
            attempts: self.attempts,
            attempts_remaining: self.attempts_remaining(),
            score: self.score,
            status: self.status,
            show_hint,
            last_hint: self.last_hint.map(str::to_owned),
            history: self.history.clone(),
            game_over: self.status.is_over(),
            secret: self.revealed_secret(),
        }
    }
}

/// Snapshot of a session for rendering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameView {
    /// Game counter within the session.
    pub game_number: u32,
    /// Active difficulty.
    pub difficulty: Difficulty,
    /// Lowest possible secret.
    pub low: i64,
    /// Highest possible secret.
    pub high: i64,
    /// Attempt limit for the difficulty.
    pub attempt_limit: u32,
    /// Attempts used.
    pub attempts: u32,
    /// Attempts left.
    pub attempts_remaining: u32,
    /// Running score.
    pub score: f64,
    /// Game status.
    pub status: GameStatus,
    /// Whether hints are shown for new guesses.
    pub show_hint: bool,
    /// Hint for the latest valid guess.
    pub last_hint: Option<String>,
    /// Submitted guesses.
    pub history: Vec<HistoryEntry>,
    /// Whether the game has ended.
    pub game_over: bool,
    /// Secret, present only after the game ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<i64>,
}
