//! Network Layer
//!
//! HTTP page and WebSocket game channel for browser players.
//! Game rules live in `game/`; this layer only owns sessions and transport.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, GameNotice, NoticeLevel, ServerError, ErrorCode};
pub use session::{PlayerSession, SessionId, SessionConfig, SessionManager, RegistryError};
pub use server::{GameServer, ServerConfig, GameServerError};
