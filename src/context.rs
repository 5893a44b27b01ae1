//! Application context shared by the CLI commands.

use std::sync::Arc;

use crate::bridge::{BridgeClient, BridgeError, BridgeServer};
use crate::config::Config;
use crate::engine::HeadlessEngine;

/// Buffer size of the in-process host ↔ engine pipe.
const PIPE_CAPACITY: usize = 64 * 1024;

/// Root application context.
#[derive(Clone)]
pub struct Context {
    /// Application configuration.
    pub config: Arc<Config>,
}

/// A connected bridge client and, when the engine runs in-process, a handle on
/// that engine for inspection and simulated input.
pub struct EngineConnection {
    pub client: BridgeClient,
    pub headless: Option<HeadlessEngine>,
}

impl Context {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Connects to the configured engine runtime, or starts a headless engine
    /// in this process when no socket is configured.
    pub async fn connect(&self) -> Result<EngineConnection, BridgeError> {
        match &self.config.bridge.socket {
            Some(socket) => Ok(EngineConnection {
                client: connect_socket(socket).await?,
                headless: None,
            }),
            None => Ok(self.spawn_headless()),
        }
    }

    fn spawn_headless(&self) -> EngineConnection {
        let engine = HeadlessEngine::new();
        let server = BridgeServer::with_layout_animation(
            engine.clone(),
            self.config.graph.layout_animation(),
        );

        let (host, remote) = tokio::io::duplex(PIPE_CAPACITY);
        tokio::spawn(async move {
            if let Err(e) = server.serve(remote).await {
                tracing::warn!(error = %e, "Headless engine stopped");
            }
        });
        tracing::debug!("Started in-process headless engine");

        EngineConnection {
            client: BridgeClient::connect(host),
            headless: Some(engine),
        }
    }
}

#[cfg(unix)]
async fn connect_socket(socket: &std::path::Path) -> Result<BridgeClient, BridgeError> {
    BridgeClient::connect_unix(socket).await
}

#[cfg(not(unix))]
async fn connect_socket(socket: &std::path::Path) -> Result<BridgeClient, BridgeError> {
    Err(BridgeError::Io(format!(
        "cannot connect to {}: Unix sockets are not supported on this platform",
        socket.display()
    )))
}
