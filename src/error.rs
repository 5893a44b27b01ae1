//! Application error types.

use thiserror::Error;

use crate::bridge::BridgeError;

/// Application-level errors for lineage.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Failed to encode output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("Person {index} does not exist (hierarchy has {count} people)")]
    UnknownPerson { index: usize, count: usize },

    #[error("Clicks can only be simulated on the in-process engine")]
    RemoteEngine,
}

impl AppError {
    /// True when the failure came from misusing the bridge rather than from the
    /// connection or engine.
    pub fn is_precondition(&self) -> bool {
        matches!(self, AppError::Bridge(e) if e.is_precondition())
    }
}
