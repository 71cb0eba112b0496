//! # Glitchy Guesser
//!
//! Session-based number guessing game served to browsers over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    GLITCHY GUESSER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Primitives                                │
//! │  └── rng.rs      - Seedable Xorshift128+ secret source       │
//! │                                                              │
//! │  game/           - Game rules (no I/O)                       │
//! │  ├── difficulty.rs - Ranges and attempt limits               │
//! │  ├── parse.rs    - Guess validation                          │
//! │  ├── evaluate.rs - Comparison and hints                      │
//! │  ├── score.rs    - Win scoring                               │
//! │  ├── state.rs    - Per-session state machine                 │
//! │  └── events.rs   - Transition events                         │
//! │                                                              │
//! │  network/        - Transport                                 │
//! │  ├── server.rs   - HTTP page + WebSocket server              │
//! │  ├── protocol.rs - Message types                             │
//! │  └── session.rs  - Player session registry                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Game Rules
//!
//! Each session holds one secret drawn uniformly from the difficulty's range.
//! Every submission costs an attempt, including ones that fail to parse.
//! A win on attempt `n` with limit `L` scores `100 - (n - 1) * 100 / L`,
//! floored at zero. The game is lost once attempts exceed the limit.
//!
//! Sessions never share state: each owns its game and its own RNG.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::SecretRng;
pub use crate::game::difficulty::Difficulty;
pub use crate::game::state::{GameSession, GameStatus, GameView};
pub use crate::game::events::{GameEvent, GameEventData};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
