//! Game Logic Module
//!
//! Pure game rules plus the per-session state machine.
//!
//! ## Module Structure
//!
//! - `difficulty`: Difficulty levels, ranges and attempt limits
//! - `parse`: Raw guess validation
//! - `evaluate`: Guess comparison and hints
//! - `score`: Win scoring
//! - `state`: Session state machine and render payload
//! - `events`: Events emitted by state transitions

pub mod difficulty;
pub mod parse;
pub mod evaluate;
pub mod score;
pub mod state;
pub mod events;

// Re-export key types
pub use difficulty::Difficulty;
pub use parse::{parse_guess, GuessError};
pub use evaluate::{evaluate, evaluate_text, Evaluation, GuessOutcome};
pub use score::score_for;
pub use state::{GameSession, GameStatus, GameView, HistoryEntry, SessionError};
pub use events::{GameEvent, GameEventData};
