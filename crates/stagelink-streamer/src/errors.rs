//! Streamer error types.

use thiserror::Error;

/// Errors that can occur in the streamer role.
#[derive(Debug, Error)]
pub enum StreamerError {
    /// WebSocket transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// Malformed or unexpected wire traffic.
    #[error("protocol error: {0}")]
    Protocol(#[from] stagelink_protocol::ProtocolError),
    /// The device could not carry out a request.
    #[error("device error: {0}")]
    Device(String),
    /// The remote end closed the connection.
    #[error("connection closed")]
    ConnectionClosed,
    /// The WebSocket handshake did not complete in time.
    #[error("handshake timed out")]
    HandshakeTimeout,
}

/// Result type for streamer operations.
pub type Result<T> = std::result::Result<T, StreamerError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
