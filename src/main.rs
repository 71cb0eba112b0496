//! Glitchy Guesser Server
//!
//! Serves the play page and the WebSocket game channel on one port.

use std::sync::Arc;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

use glitchy_guesser::{
    VERSION,
    game::difficulty::Difficulty,
    network::server::{GameServer, ServerConfig},
};

#[cfg(feature = "debug-tracing")]
const DEFAULT_FILTER: &str = "glitchy_guesser=debug,info";
#[cfg(not(feature = "debug-tracing"))]
const DEFAULT_FILTER: &str = "info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = ServerConfig::from_env();

    info!("Glitchy Guesser v{}", VERSION);
    for difficulty in Difficulty::ALL {
        let (low, high) = difficulty.range();
        info!(
            "{}: {}..={} in {} attempts",
            difficulty, low, high, difficulty.attempt_limit()
        );
    }
    info!(
        "Default difficulty {}, hints {}, idle timeout {:?}",
        config.default_difficulty,
        if config.show_hint { "on" } else { "off" },
        config.idle_timeout
    );

    let server = Arc::new(GameServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_server.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;

    // Let open connections deliver their shutdown notice
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    info!("Server stopped");

    Ok(())
}
