//! Bridge error types with wire conversion.

use thiserror::Error;

use crate::engine::EngineError;

use super::protocol::RemoteError;

/// Errors raised by bridge operations on either side of the call boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    // Precondition violations
    #[error("Graph not initialized. Call initializeGraph first.")]
    NotInitialized,

    #[error("Graph already initialized")]
    AlreadyInitialized,

    #[error("Invalid rectangle: {0}")]
    InvalidRect(String),

    // Protocol errors
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Invalid params for {method}: {reason}")]
    InvalidParams { method: String, reason: String },

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    // Transport errors
    #[error("Transport error: {0}")]
    Io(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),

    #[error("Failed to decode message: {0}")]
    Decode(String),

    #[error("Frame of {0} bytes exceeds the frame size limit")]
    FrameTooLarge(usize),

    #[error("Connection closed")]
    ConnectionClosed,

    // Engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Remote error [{kind}]: {message}")]
    Remote { kind: String, message: String },
}

impl BridgeError {
    /// True for errors caused by calling an operation the wrong way, as opposed
    /// to the transport or engine failing.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BridgeError::NotInitialized
                | BridgeError::AlreadyInitialized
                | BridgeError::InvalidRect(_)
        )
    }

    /// Stable error kind sent over the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::NotInitialized => "not_initialized",
            BridgeError::AlreadyInitialized => "already_initialized",
            BridgeError::InvalidRect(_) => "invalid_rect",
            BridgeError::UnknownMethod(_) => "unknown_method",
            BridgeError::InvalidParams { .. } => "invalid_params",
            BridgeError::UnexpectedResponse(_) => "unexpected_response",
            BridgeError::Io(_) => "io",
            BridgeError::Encode(_) => "encode",
            BridgeError::Decode(_) => "decode",
            BridgeError::FrameTooLarge(_) => "frame_too_large",
            BridgeError::ConnectionClosed => "connection_closed",
            BridgeError::Engine(_) => "engine",
            BridgeError::Remote { .. } => "remote",
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

impl From<&BridgeError> for RemoteError {
    fn from(err: &BridgeError) -> Self {
        let message = match err {
            BridgeError::InvalidRect(reason) => reason.clone(),
            BridgeError::UnknownMethod(method) => method.clone(),
            BridgeError::Engine(e) => e.0.clone(),
            other => other.to_string(),
        };
        RemoteError {
            kind: err.kind().to_string(),
            message,
        }
    }
}

impl From<RemoteError> for BridgeError {
    /// Restores precondition violations so callers can match on them; anything
    /// else stays a remote error.
    fn from(err: RemoteError) -> Self {
        match err.kind.as_str() {
            "not_initialized" => BridgeError::NotInitialized,
            "already_initialized" => BridgeError::AlreadyInitialized,
            "invalid_rect" => BridgeError::InvalidRect(err.message),
            "unknown_method" => BridgeError::UnknownMethod(err.message),
            _ => BridgeError::Remote {
                kind: err.kind,
                message: err.message,
            },
        }
    }
}
