//! Player Session Management
//!
//! Owns one [`GameSession`] per session id and translates client actions
//! into game transitions. Sessions outlive their connection for a while so
//! a reloaded page can resume; the cleanup loop drops them once idle.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::rng::SecretRng;
use crate::game::difficulty::Difficulty;
use crate::game::events::GameEvent;
use crate::game::state::GameSession;
use crate::network::protocol::{
    DifficultyInfo, GameNotice, ServerError, ServerMessage, WelcomeInfo,
};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Short hex prefix of a session id, for logs.
pub fn short_id(id: &SessionId) -> String {
    hex::encode(&id[..4])
}

/// Defaults applied to new sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Difficulty of the first game.
    pub default_difficulty: Difficulty,
    /// Initial hint toggle.
    pub show_hint: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_difficulty: Difficulty::default(),
            show_hint: true,
        }
    }
}

/// A player's session.
pub struct PlayerSession {
    /// Unique session identifier.
    pub id: SessionId,
    /// The game being played.
    game: GameSession,
    /// Secret source for this session only.
    rng: SecretRng,
    /// Hint toggle.
    show_hint: bool,
    /// Whether a connection currently drives this session.
    attached: bool,
    /// Whether the player has acted on this session yet.
    played: bool,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// Last message handled.
    last_activity: Instant,
}

impl PlayerSession {
    /// Create a session and start its first game.
    pub fn new(id: SessionId, config: &SessionConfig, entropy: u64) -> Self {
        let mut rng = SecretRng::for_session(&id, entropy);
        let game = GameSession::new(config.default_difficulty, &mut rng);

        Self {
            id,
            game,
            rng,
            show_hint: config.show_hint,
            attached: true,
            played: false,
            created_at: Utc::now(),
            last_activity: Instant::now(),
        }
    }

    /// Current game.
    pub fn game(&self) -> &GameSession {
        &self.game
    }

    /// Hint toggle.
    pub fn show_hint(&self) -> bool {
        self.show_hint
    }

    /// Whether a connection is attached.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Time since the last handled message.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Record activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Session greeting.
    pub fn welcome(&self) -> ServerMessage {
        ServerMessage::Welcome(WelcomeInfo {
            session_id: uuid::Uuid::from_bytes(self.id).to_string(),
            server_version: crate::VERSION.to_string(),
            difficulties: Difficulty::ALL.into_iter().map(DifficultyInfo::from).collect(),
            created_at: self.created_at.to_rfc3339(),
        })
    }

    /// Current render payload.
    pub fn state(&self) -> ServerMessage {
        ServerMessage::State(self.game.view(self.show_hint))
    }

    /// Start a new game, on the given difficulty label or the current one.
    pub fn new_game(&mut self, difficulty: Option<&str>) -> Vec<ServerMessage> {
        let difficulty = difficulty
            .map(Difficulty::from_label_or_fallback)
            .unwrap_or_else(|| self.game.difficulty());
        let event = self.game.start_new_game(difficulty, &mut self.rng);
        self.played = true;
        self.reply(&[event])
    }

    /// Select a difficulty; the game restarts only if it changed.
    pub fn set_difficulty(&mut self, label: &str) -> Vec<ServerMessage> {
        let difficulty = Difficulty::from_label_or_fallback(label);
        self.played = true;
        match self.game.change_difficulty(difficulty, &mut self.rng) {
            Some(event) => self.reply(&[event]),
            None => vec![self.state()],
        }
    }

    /// Submit a guess.
    pub fn guess(&mut self, raw: Option<&str>, show_hint: Option<bool>) -> Vec<ServerMessage> {
        if let Some(show) = show_hint {
            self.show_hint = show;
        }
        self.played = true;

        match self.game.submit_guess(raw, self.show_hint) {
            Ok(events) => self.reply(&events),
            Err(err) => {
                debug!("Session {} rejected guess: {}", short_id(&self.id), err);
                vec![ServerMessage::Error(ServerError::from(err)), self.state()]
            }
        }
    }

    /// Toggle hint visibility for subsequent guesses.
    pub fn set_hint(&mut self, show: bool) -> Vec<ServerMessage> {
        self.show_hint = show;
        self.played = true;
        vec![self.state()]
    }

    /// Notices for the events followed by the new state.
    fn reply(&self, events: &[GameEvent]) -> Vec<ServerMessage> {
        events
            .iter()
            .filter_map(|event| GameNotice::from_event(event, self.show_hint))
            .map(ServerMessage::Event)
            .chain(std::iter::once(self.state()))
            .collect()
    }
}

/// Session registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Unknown or expired session.
    #[error("Session not found")]
    NotFound,

    /// Session attached to another connection.
    #[error("Session already in use")]
    InUse,
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all live sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, Arc<RwLock<PlayerSession>>>>,
    /// Defaults for new sessions.
    config: SessionConfig,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Create a new session, attached to the caller.
    pub async fn create_session(&self) -> Arc<RwLock<PlayerSession>> {
        let id = uuid::Uuid::new_v4().into_bytes();
        let entropy = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let session = Arc::new(RwLock::new(PlayerSession::new(id, &self.config, entropy)));

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session.clone());
        info!("Created session {} ({} live)", short_id(&id), sessions.len());

        session
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<Arc<RwLock<PlayerSession>>> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Attach to a detached session.
    pub async fn attach(&self, id: &SessionId) -> Result<Arc<RwLock<PlayerSession>>, RegistryError> {
        // Registry read lock held until attached, so cleanup cannot evict in between
        let sessions = self.sessions.read().await;
        let session = sessions.get(id).cloned().ok_or(RegistryError::NotFound)?;
        {
            let mut guard = session.write().await;
            if guard.attached {
                return Err(RegistryError::InUse);
            }
            guard.attached = true;
            guard.touch();
        }
        drop(sessions);
        debug!("Session {} reattached", short_id(id));
        Ok(session)
    }

    /// Let go of a session whose connection is leaving it.
    ///
    /// Sessions the player never acted on are removed right away; the rest
    /// are detached and stay resumable until idle cleanup.
    pub async fn release(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get(id).cloned() else {
            return;
        };

        let mut guard = session.write().await;
        if guard.played {
            guard.attached = false;
            guard.touch();
        } else {
            sessions.remove(id);
            debug!("Dropped unused session {}", short_id(id));
        }
    }

    /// Remove a session.
    pub async fn remove_session(&self, id: &SessionId) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
    }

    /// Get live session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Drop detached sessions idle longer than `idle_timeout`.
    /// Returns the number removed.
    pub async fn cleanup(&self, idle_timeout: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut to_remove = Vec::new();

        for (id, session) in sessions.iter() {
            let s = session.read().await;
            if !s.attached && s.idle_for() > idle_timeout {
                to_remove.push(*id);
            }
        }

        for id in &to_remove {
            sessions.remove(id);
            debug!("Expired session {}", short_id(id));
        }

        to_remove.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::GameStatus;
    use crate::network::protocol::{ErrorCode, NoticeLevel};

    fn create_test_session() -> PlayerSession {
        PlayerSession::new([0; 16], &SessionConfig::default(), 42)
    }

    fn last_state(replies: &[ServerMessage]) -> &crate::game::state::GameView {
        match replies.last() {
            Some(ServerMessage::State(view)) => view,
            other => panic!("expected state, got {other:?}"),
        }
    }

    #[test]
    fn test_new_session_defaults() {
        let session = create_test_session();
        assert_eq!(session.game().difficulty(), Difficulty::Normal);
        assert_eq!(session.game().status(), GameStatus::Playing);
        assert!(session.show_hint());
        assert!(session.is_attached());
    }

    #[test]
    fn test_guess_replies_with_notice_and_state() {
        let mut session = create_test_session();
        let replies = session.guess(Some("abc"), None);

        assert_eq!(replies.len(), 2);
        match &replies[0] {
            ServerMessage::Event(notice) => {
                assert_eq!(notice.level, NoticeLevel::Error);
                assert_eq!(notice.message, "That is not a number.");
            }
            other => panic!("expected notice, got {other:?}"),
        }
        assert_eq!(last_state(&replies).attempts, 1);
    }

    #[test]
    fn test_hidden_hint_sends_state_only() {
        let mut session = create_test_session();
        let replies = session.guess(Some("0"), Some(false));

        assert!(!session.show_hint());
        assert_eq!(replies.len(), 1);
        assert_eq!(last_state(&replies).last_hint, None);
    }

    #[test]
    fn test_guess_after_game_over() {
        let mut session = create_test_session();
        for _ in 0..8 {
            session.guess(Some("0"), None);
        }
        assert_eq!(session.game().status(), GameStatus::Lost);

        let replies = session.guess(Some("1"), None);
        match &replies[0] {
            ServerMessage::Error(err) => assert_eq!(err.code, ErrorCode::GameOver),
            other => panic!("expected error, got {other:?}"),
        }
        assert!(last_state(&replies).secret.is_some());
    }

    #[test]
    fn test_set_difficulty_restarts_on_change() {
        let mut session = create_test_session();
        session.guess(Some("1"), None);

        let replies = session.set_difficulty("Normal");
        assert_eq!(replies.len(), 1);
        assert_eq!(last_state(&replies).attempts, 1);

        let replies = session.set_difficulty("Easy");
        let view = last_state(&replies);
        assert_eq!(view.difficulty, Difficulty::Easy);
        assert_eq!(view.attempts, 0);
        assert_eq!(view.game_number, 2);
    }

    #[test]
    fn test_new_game_keeps_or_switches_difficulty() {
        let mut session = create_test_session();

        let view = last_state(&session.new_game(None)).clone();
        assert_eq!(view.difficulty, Difficulty::Normal);

        let view = last_state(&session.new_game(Some("Bogus"))).clone();
        assert_eq!(view.difficulty, Difficulty::Hard);
        assert_eq!((view.low, view.high), (1, 100));
    }

    #[tokio::test]
    async fn test_session_manager() {
        let manager = SessionManager::default();

        let session = manager.create_session().await;
        let id = session.read().await.id;
        assert_eq!(manager.session_count().await, 1);
        assert!(manager.get_session(&id).await.is_some());

        manager.remove_session(&id).await;
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let manager = SessionManager::default();
        let a = manager.create_session().await;
        let b = manager.create_session().await;

        a.write().await.guess(Some("1"), None);
        a.write().await.guess(Some("2"), None);

        assert_eq!(a.read().await.game().attempts(), 2);
        assert_eq!(b.read().await.game().attempts(), 0);
    }

    #[test]
    fn test_hints_off_by_config() {
        let config = SessionConfig { show_hint: false, ..Default::default() };
        let mut session = PlayerSession::new([0; 16], &config, 1);

        let view = match session.state() {
            ServerMessage::State(view) => view,
            other => panic!("expected state, got {other:?}"),
        };
        assert!(!view.show_hint);

        let replies = session.guess(Some("0"), None);
        assert_eq!(replies.len(), 1);
        let view = last_state(&replies);
        assert!(!view.show_hint);
        assert_eq!(view.last_hint, None);
        assert!(!session.show_hint());
    }

    #[test]
    fn test_state_reports_hint_toggle() {
        let mut session = create_test_session();
        assert!(!last_state(&session.set_hint(false)).show_hint);

        let replies = session.set_hint(true);
        let json = replies[0].to_json().unwrap();
        assert!(json.contains(r#""show_hint":true"#));
    }

    async fn played_session(manager: &SessionManager) -> (SessionId, Arc<RwLock<PlayerSession>>) {
        let session = manager.create_session().await;
        session.write().await.guess(Some("1"), None);
        let id = session.read().await.id;
        (id, session)
    }

    #[tokio::test]
    async fn test_attach_and_release() {
        let manager = SessionManager::default();
        let (id, session) = played_session(&manager).await;

        assert_eq!(manager.attach(&id).await.err(), Some(RegistryError::InUse));

        manager.release(&id).await;
        assert!(!session.read().await.is_attached());
        assert!(manager.attach(&id).await.is_ok());

        assert_eq!(manager.attach(&[9; 16]).await.err(), Some(RegistryError::NotFound));
    }

    #[tokio::test]
    async fn test_release_drops_unused_sessions() {
        let manager = SessionManager::default();
        let unused = manager.create_session().await;
        let unused_id = unused.read().await.id;
        let (played_id, _) = played_session(&manager).await;

        manager.release(&unused_id).await;
        manager.release(&played_id).await;

        assert!(manager.get_session(&unused_id).await.is_none());
        assert!(manager.get_session(&played_id).await.is_some());
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_attached_session_survives_cleanup() {
        let manager = SessionManager::default();
        let (id, _) = played_session(&manager).await;
        manager.release(&id).await;

        manager.attach(&id).await.unwrap();
        assert_eq!(manager.cleanup(Duration::ZERO).await, 0);
        assert!(manager.get_session(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_cleanup_keeps_attached_sessions() {
        let manager = SessionManager::default();
        let attached = manager.create_session().await;
        let (detached_id, _) = played_session(&manager).await;
        manager.release(&detached_id).await;

        assert_eq!(manager.cleanup(Duration::ZERO).await, 1);
        assert_eq!(manager.session_count().await, 1);
        assert!(manager.get_session(&detached_id).await.is_none());
        assert!(attached.read().await.is_attached());
    }
}
