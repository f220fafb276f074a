//! Error types for the session module

use thiserror::Error;

/// Errors raised by a connection
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    Closed,
}

/// Session error types
#[derive(Debug, Error)]
pub enum SessionError {
    /// The handshake frame could not be written; the connection is closed.
    #[error("Handshake failed: {0}")]
    Handshake(#[source] TransportError),

    #[error("Encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;
