//! Game Server
//!
//! Async server for browser players. One TCP port carries both the play page
//! (plain HTTP) and the WebSocket game channel; requests are told apart by
//! their `Upgrade` header before the handshake.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::difficulty::Difficulty;
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
use crate::network::session::{
    short_id, PlayerSession, RegistryError, SessionConfig, SessionId, SessionManager,
};

/// Play page served at `/`.
const INDEX_HTML: &str = include_str!("index.html");

/// Largest request head accepted before routing.
const MAX_REQUEST_HEAD: usize = 8192;

/// Peeks allowed while waiting for a complete request head.
const HEAD_PEEK_ATTEMPTS: u32 = 200;

/// How often detached sessions are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// How long a detached session is kept for `resume`.
    pub idle_timeout: Duration,
    /// Difficulty of a new session's first game.
    pub default_difficulty: Difficulty,
    /// Initial hint toggle for new sessions.
    pub show_hint: bool,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            idle_timeout: Duration::from_secs(300),
            default_difficulty: Difficulty::Normal,
            show_hint: true,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// Reads `GUESSER_BIND_ADDR`, `GUESSER_MAX_CONNECTIONS`,
    /// `GUESSER_IDLE_TIMEOUT_SECS`, `GUESSER_DEFAULT_DIFFICULTY` and
    /// `GUESSER_SHOW_HINT`. Unset or malformed values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: parse_or(&lookup, "GUESSER_BIND_ADDR", defaults.bind_addr),
            max_connections: parse_or(&lookup, "GUESSER_MAX_CONNECTIONS", defaults.max_connections),
            idle_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GUESSER_IDLE_TIMEOUT_SECS",
                defaults.idle_timeout.as_secs(),
            )),
            default_difficulty: lookup("GUESSER_DEFAULT_DIFFICULTY")
                .and_then(|label| {
                    let parsed = Difficulty::from_label(label.trim());
                    if parsed.is_none() {
                        warn!("Ignoring GUESSER_DEFAULT_DIFFICULTY={:?}", label);
                    }
                    parsed
                })
                .unwrap_or(defaults.default_difficulty),
            show_hint: lookup("GUESSER_SHOW_HINT")
                .and_then(|v| match v.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" | "yes" => Some(true),
                    "false" | "0" | "no" => Some(false),
                    _ => {
                        warn!("Ignoring GUESSER_SHOW_HINT={:?}", v);
                        None
                    }
                })
                .unwrap_or(defaults.show_hint),
            version: defaults.version,
        }
    }

    /// Defaults handed to the session manager.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            default_difficulty: self.default_difficulty,
            show_hint: self.show_hint,
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}", key, raw);
            default
        }),
        None => default,
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Socket error, including failure to bind.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Where an incoming request is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    /// WebSocket upgrade to the game channel.
    WebSocket,
    /// The play page.
    Index,
    /// Liveness probe.
    Health,
    /// Anything else.
    NotFound,
}

/// Route a raw HTTP request head.
fn route_request(head: &str) -> Route {
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default();
    let target = request_line.next().unwrap_or_default();
    let path = target.split('?').next().unwrap_or_default();

    let upgrade = lines
        .filter_map(|line| line.split_once(':'))
        .any(|(name, value)| {
            name.trim().eq_ignore_ascii_case("upgrade")
                && value.trim().eq_ignore_ascii_case("websocket")
        });
    if upgrade {
        return Route::WebSocket;
    }

    match (method, path) {
        ("GET" | "HEAD", "/" | "/index.html") => Route::Index,
        ("GET" | "HEAD", "/health") => Route::Health,
        _ => Route::NotFound,
    }
}

/// Byte length of the request head, terminator included.
fn head_len(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4)
}

/// Wait until a full request head is buffered, without consuming it.
async fn peek_request_head(stream: &TcpStream) -> std::io::Result<Option<(String, usize)>> {
    let mut buf = vec![0u8; MAX_REQUEST_HEAD];

    for _ in 0..HEAD_PEEK_ATTEMPTS {
        let n = stream.peek(&mut buf).await?;
        if n == 0 {
            return Ok(None);
        }
        if let Some(len) = head_len(&buf[..n]) {
            return Ok(Some((String::from_utf8_lossy(&buf[..len]).into_owned(), len)));
        }
        if n == buf.len() {
            return Ok(None);
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    Ok(None)
}

/// Whether the request is a `HEAD`, which gets headers without a body.
fn is_head_request(head: &str) -> bool {
    head.split_whitespace().next() == Some("HEAD")
}

fn http_response(status: &str, content_type: &str, body: &str, head_only: bool) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        if head_only { "" } else { body }
    )
}

/// Connected WebSocket client.
struct ConnectedClient {
    /// Session driven by this connection.
    session_id: SessionId,
    /// Connection time.
    connected_at: Instant,
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Session manager.
    sessions: Arc<SessionManager>,
    /// Connected clients.
    clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            sessions: Arc::new(SessionManager::new(config.session_config())),
            config,
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and run until shutdown.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Accept connections on `listener` until shutdown.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), GameServerError> {
        info!("Game server listening on {}", listener.local_addr()?);

        let cleanup_sessions = self.sessions.clone();
        let idle_timeout = self.config.idle_timeout;
        let cleanup_handle = tokio::spawn(async move {
            Self::run_cleanup_loop(cleanup_sessions, idle_timeout).await;
        });

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            debug!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        cleanup_handle.abort();

        Ok(())
    }

    /// Route a new TCP connection to the page or the game channel.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let clients = self.clients.clone();
        let sessions = self.sessions.clone();
        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let head = match peek_request_head(&stream).await {
                Ok(Some(head)) => head,
                Ok(None) => {
                    debug!("Dropping {}: incomplete request", addr);
                    return;
                }
                Err(e) => {
                    debug!("Read error from {}: {}", addr, e);
                    return;
                }
            };

            let result = match route_request(&head.0) {
                Route::WebSocket => {
                    Self::serve_websocket(stream, addr, clients, sessions, shutdown_rx).await
                }
                route => Self::serve_http(stream, head.1, route, is_head_request(&head.0)).await,
            };

            if let Err(e) = result {
                error!("Connection {} failed: {}", addr, e);
            }
        });
    }

    /// Answer a plain HTTP request and close.
    async fn serve_http(
        mut stream: TcpStream,
        head_len: usize,
        route: Route,
        head_only: bool,
    ) -> Result<(), GameServerError> {
        let mut head = vec![0u8; head_len];
        stream.read_exact(&mut head).await?;

        let response = match route {
            Route::Index => http_response("200 OK", "text/html; charset=utf-8", INDEX_HTML, head_only),
            Route::Health => http_response("200 OK", "text/plain", "OK", head_only),
            Route::NotFound | Route::WebSocket => {
                http_response("404 Not Found", "text/plain", "Not Found", head_only)
            }
        };

        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }

    /// Run the game channel for one browser.
    async fn serve_websocket(
        stream: TcpStream,
        addr: SocketAddr,
        clients: Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        sessions: Arc<SessionManager>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), GameServerError> {
        let ws_stream = accept_async(stream).await?;

        let (mut ws_sender, mut ws_receiver) = ws_stream.split();
        let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

        // Spawn message sender task
        let sender_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let text = match msg.to_json() {
                    Ok(t) => t,
                    Err(e) => {
                        error!("Failed to serialize message: {}", e);
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            let _ = ws_sender.close().await;
        });

        let mut session = sessions.create_session().await;
        let session_id = session.read().await.id;
        clients.write().await.insert(addr, ConnectedClient {
            session_id,
            connected_at: Instant::now(),
        });
        info!("Client {} playing session {}", addr, short_id(&session_id));

        Self::send_greeting(&session, &msg_tx).await;

        loop {
            tokio::select! {
                msg = ws_receiver.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let client_msg = match ClientMessage::from_json(&text) {
                                Ok(m) => m,
                                Err(e) => {
                                    debug!("Invalid message from {}: {}", addr, e);
                                    let _ = msg_tx.send(ServerMessage::Error(ServerError::new(
                                        ErrorCode::InvalidMessage,
                                        "Invalid message format",
                                    ))).await;
                                    continue;
                                }
                            };

                            Self::handle_client_message(
                                addr,
                                client_msg,
                                &mut session,
                                &clients,
                                &sessions,
                                &msg_tx,
                            ).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            debug!("Client {} disconnected", addr);
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", addr, e);
                            break;
                        }
                        _ => {}
                    }
                }
                _ = shutdown_rx.recv() => {
                    let _ = msg_tx.send(ServerMessage::Shutdown {
                        reason: "Server shutting down".to_string(),
                    }).await;
                    break;
                }
            }
        }

        // Release the session for a later resume
        let client = clients.write().await.remove(&addr);
        if let Some(client) = client {
            sessions.release(&client.session_id).await;
            info!(
                "Client {} left session {} after {:?}",
                addr,
                short_id(&client.session_id),
                client.connected_at.elapsed()
            );
        }

        // Flush pending messages, then close
        drop(msg_tx);
        let _ = tokio::time::timeout(Duration::from_secs(1), sender_task).await;

        Ok(())
    }

    /// Send `welcome` and `state` for the current session.
    async fn send_greeting(session: &Arc<RwLock<PlayerSession>>, sender: &mpsc::Sender<ServerMessage>) {
        let (welcome, state) = {
            let s = session.read().await;
            (s.welcome(), s.state())
        };
        let _ = sender.send(welcome).await;
        let _ = sender.send(state).await;
    }

    /// Handle a client message.
    async fn handle_client_message(
        addr: SocketAddr,
        msg: ClientMessage,
        session: &mut Arc<RwLock<PlayerSession>>,
        clients: &Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let replies = match msg {
            ClientMessage::NewGame { difficulty } => {
                session.write().await.new_game(difficulty.as_deref())
            }
            ClientMessage::SetDifficulty { difficulty } => {
                session.write().await.set_difficulty(&difficulty)
            }
            ClientMessage::Guess { raw, show_hint } => {
                session.write().await.guess(raw.as_deref(), show_hint)
            }
            ClientMessage::SetHint { show } => {
                session.write().await.set_hint(show)
            }
            ClientMessage::Sync => {
                vec![session.read().await.state()]
            }
            ClientMessage::Resume { session_id } => {
                Self::handle_resume(addr, &session_id, session, clients, sessions, sender).await;
                return;
            }
            ClientMessage::Ping { timestamp } => {
                vec![ServerMessage::Pong {
                    timestamp,
                    server_time: chrono::Utc::now().timestamp_millis(),
                }]
            }
        };

        session.write().await.touch();

        for reply in replies {
            let _ = sender.send(reply).await;
        }
    }

    /// Move this connection onto a detached session.
    async fn handle_resume(
        addr: SocketAddr,
        requested: &str,
        session: &mut Arc<RwLock<PlayerSession>>,
        clients: &Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>,
        sessions: &Arc<SessionManager>,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let current_id = session.read().await.id;

        let target: Result<SessionId, RegistryError> = uuid::Uuid::parse_str(requested)
            .map(|uuid| uuid.into_bytes())
            .map_err(|_| RegistryError::NotFound);

        let resumed = match target {
            Ok(id) if id == current_id => Ok(session.clone()),
            Ok(id) => sessions.attach(&id).await,
            Err(e) => Err(e),
        };

        match resumed {
            Ok(target) => {
                let target_id = target.read().await.id;
                if target_id != current_id {
                    sessions.release(&current_id).await;
                    if let Some(client) = clients.write().await.get_mut(&addr) {
                        client.session_id = target_id;
                    }
                    info!("Client {} resumed session {}", addr, short_id(&target_id));
                }
                *session = target;
                Self::send_greeting(session, sender).await;
            }
            Err(e) => {
                debug!("Resume by {} refused: {}", addr, e);
                let code = match e {
                    RegistryError::NotFound => ErrorCode::SessionNotFound,
                    RegistryError::InUse => ErrorCode::SessionInUse,
                };
                let _ = sender.send(ServerMessage::Error(ServerError::new(code, e.to_string()))).await;
            }
        }
    }

    /// Run cleanup loop.
    async fn run_cleanup_loop(sessions: Arc<SessionManager>, idle_timeout: Duration) {
        let mut interval = interval(CLEANUP_INTERVAL.min(idle_timeout.max(Duration::from_secs(1))));

        loop {
            interval.tick().await;

            let removed = sessions.cleanup(idle_timeout).await;
            if removed > 0 {
                info!("Expired {} idle sessions", removed);
            }
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get live session count.
    pub async fn session_count(&self) -> usize {
        self.sessions.session_count().await
    }
}
