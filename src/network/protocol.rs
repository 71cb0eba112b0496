//! Protocol Messages
//!
//! Wire format for browser-server communication over WebSocket.
//! All messages are JSON text frames tagged by `type`.

use serde::{Serialize, Deserialize};

use crate::game::difficulty::Difficulty;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::state::{GameView, SessionError};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from the browser to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a new game, optionally switching difficulty.
    NewGame {
        /// Difficulty label ("Easy", "Normal", "Hard").
        #[serde(default)]
        difficulty: Option<String>,
    },

    /// Select a difficulty. Restarts the game when it changes.
    SetDifficulty {
        /// Difficulty label.
        difficulty: String,
    },

    /// Submit the guess box contents.
    Guess {
        /// Raw text; absent when the box was never filled.
        #[serde(default)]
        raw: Option<String>,
        /// Hint toggle at submit time; the session default applies when absent.
        #[serde(default)]
        show_hint: Option<bool>,
    },

    /// Toggle hint visibility.
    SetHint {
        /// Whether hints are shown.
        show: bool,
    },

    /// Request the current state.
    Sync,

    /// Reattach to a session left by an earlier connection.
    Resume {
        /// Session id from a previous `welcome`.
        session_id: String,
    },

    /// Ping for latency measurement.
    Ping {
        /// Client timestamp, echoed back.
        timestamp: u64,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from the server to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once per connection and after a successful resume.
    Welcome(WelcomeInfo),

    /// Render payload after every event.
    State(GameView),

    /// Feedback about the last action.
    Event(GameNotice),

    /// Error message.
    Error(ServerError),

    /// Pong response.
    Pong {
        /// Client timestamp from the ping.
        timestamp: u64,
        /// Server time in Unix milliseconds.
        server_time: i64,
    },

    /// Server is shutting down.
    Shutdown {
        /// Reason shown to the player.
        reason: String,
    },
}

/// Session information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WelcomeInfo {
    /// Session identifier (UUID string), usable with `resume`.
    pub session_id: String,
    /// Server version.
    pub server_version: String,
    /// Selectable difficulties.
    pub difficulties: Vec<DifficultyInfo>,
    /// When the session was created (RFC 3339).
    pub created_at: String,
}

/// Difficulty settings as shown in the sidebar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyInfo {
    /// Label.
    pub label: String,
    /// Lowest possible secret.
    pub low: i64,
    /// Highest possible secret.
    pub high: i64,
    /// Attempts allowed.
    pub attempt_limit: u32,
}

impl From<Difficulty> for DifficultyInfo {
    fn from(difficulty: Difficulty) -> Self {
        let (low, high) = difficulty.range();
        Self {
            label: difficulty.label().to_string(),
            low,
            high,
            attempt_limit: difficulty.attempt_limit(),
        }
    }
}

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Neutral information.
    Info,
    /// Directional hint.
    Hint,
    /// Positive outcome.
    Success,
    /// Rejected input or lost game.
    Error,
}

/// Player-facing feedback derived from a game event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameNotice {
    /// Styling level.
    pub level: NoticeLevel,
    /// Text to display.
    pub message: String,
    /// Whether the game just ended.
    pub game_ended: bool,
}

impl GameNotice {
    /// Convert a game event to a notice for the browser.
    ///
    /// Evaluated guesses produce no notice when hints are hidden; the hint
    /// reaches the browser through `GameView::last_hint` instead.
    pub fn from_event(event: &GameEvent, show_hint: bool) -> Option<Self> {
        let level = match &event.data {
            GameEventData::GameStarted { .. } => NoticeLevel::Info,
            GameEventData::GuessRejected { .. } => NoticeLevel::Error,
            GameEventData::GuessEvaluated { .. } if !show_hint => return None,
            GameEventData::GuessEvaluated { .. } => NoticeLevel::Hint,
            GameEventData::GameWon { .. } => NoticeLevel::Success,
            GameEventData::GameLost { .. } => NoticeLevel::Error,
        };

        Some(Self {
            level,
            message: event.message(),
            game_ended: event.is_terminal(),
        })
    }
}

/// Server error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
}

impl ServerError {
    /// Create an error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<SessionError> for ServerError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::GameOver { .. } => Self::new(ErrorCode::GameOver, err.player_message()),
        }
    }
}

/// Error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Message could not be decoded.
    InvalidMessage,
    /// Guess submitted after the game ended.
    GameOver,
    /// Resume target does not exist or has expired.
    SessionNotFound,
    /// Resume target is attached to another connection.
    SessionInUse,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::evaluate::GuessOutcome;
    use crate::game::parse::GuessError;
    use crate::game::state::{GameSession, GameStatus};

    #[test]
    fn test_client_messages_from_browser_json() {
        let msg = ClientMessage::from_json(r#"{"type":"guess","raw":"42","show_hint":true}"#).unwrap();
        assert_eq!(msg, ClientMessage::Guess { raw: Some("42".into()), show_hint: Some(true) });

        let msg = ClientMessage::from_json(r#"{"type":"guess"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Guess { raw: None, show_hint: None });

        let msg = ClientMessage::from_json(r#"{"type":"new_game"}"#).unwrap();
        assert_eq!(msg, ClientMessage::NewGame { difficulty: None });

        let msg = ClientMessage::from_json(r#"{"type":"set_difficulty","difficulty":"Hard"}"#).unwrap();
        assert_eq!(msg, ClientMessage::SetDifficulty { difficulty: "Hard".into() });

        let msg = ClientMessage::from_json(r#"{"type":"sync"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Sync);
    }

    #[test]
    fn test_unknown_message_rejected() {
        assert!(ClientMessage::from_json(r#"{"type":"cheat"}"#).is_err());
        assert!(ClientMessage::from_json("not json").is_err());
    }

    #[test]
    fn test_state_message_json() {
        let session = GameSession::with_secret(Difficulty::Normal, 17);
        let msg = ServerMessage::State(session.view(false));
        let json = msg.to_json().unwrap();

        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""status":"playing""#));
        assert!(!json.contains("secret"));
        assert!(json.contains(r#""show_hint":false"#));

        let parsed = ServerMessage::from_json(&json).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_notice_from_events() {
        let hint = GameEvent::guess_evaluated(1, 1, 10, GuessOutcome::TooLow);
        let notice = GameNotice::from_event(&hint, true).unwrap();
        assert_eq!(notice.level, NoticeLevel::Hint);
        assert_eq!(notice.message, "📈 Go HIGHER!");
        assert!(!notice.game_ended);
        assert!(GameNotice::from_event(&hint, false).is_none());

        let rejected = GameEvent::guess_rejected(1, 1, Some(""), GuessError::EmptyInput);
        let notice = GameNotice::from_event(&rejected, false).unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Enter a guess.");

        let won = GameEvent::game_won(1, 2, 10, 85.0);
        let notice = GameNotice::from_event(&won, false).unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(notice.game_ended);
    }

    #[test]
    fn test_error_codes() {
        let error: ServerError = SessionError::GameOver { status: GameStatus::Lost }.into();
        let json = ServerMessage::Error(error).to_json().unwrap();
        assert!(json.contains("game_over"));
        assert!(json.contains("Game over. Start a new game to try again."));
    }

    #[test]
    fn test_difficulty_info() {
        let info = DifficultyInfo::from(Difficulty::Easy);
        assert_eq!(info.label, "Easy");
        assert_eq!((info.low, info.high, info.attempt_limit), (1, 20, 8));
    }
}
