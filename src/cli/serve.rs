//! Serve command handler.

use std::path::Path;

use color_eyre::Result;

use crate::bridge::BridgeServer;
use crate::config::Config;
use crate::engine::HeadlessEngine;
use crate::error::AppError;

use super::App;

impl App {
    /// Serve a headless engine to hosts connecting on `socket`.
    #[cfg(unix)]
    pub async fn run_serve(&self, socket: &Path) -> Result<()> {
        let config = Config::load()?;
        let animation = config.graph.layout_animation();

        if remove_stale_socket(socket)? {
            tracing::debug!(socket = %socket.display(), "Removed stale socket");
        }

        let serve = crate::bridge::listen_unix(socket, || {
            BridgeServer::with_layout_animation(HeadlessEngine::new(), animation)
        });

        tokio::select! {
            result = serve => result.map_err(AppError::from)?,
            _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
        }

        if let Err(e) = std::fs::remove_file(socket) {
            tracing::debug!(error = %e, "Socket already gone");
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn run_serve(&self, socket: &Path) -> Result<()> {
        Err(color_eyre::eyre::eyre!(
            "Cannot listen on {}: Unix sockets are not supported on this platform",
            socket.display()
        ))
    }
}

/// Removes a socket left behind by an earlier run.
///
/// Returns whether something was removed. Anything at `path` that is not a
/// socket is left alone and reported as an error.
#[cfg(unix)]
fn remove_stale_socket(path: &Path) -> std::io::Result<bool> {
    use std::io::{Error, ErrorKind};
    use std::os::unix::fs::FileTypeExt;

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if !metadata.file_type().is_socket() {
        return Err(Error::new(
            ErrorKind::AlreadyExists,
            format!("{} exists and is not a socket", path.display()),
        ));
    }
    std::fs::remove_file(path)?;
    Ok(true)
}
