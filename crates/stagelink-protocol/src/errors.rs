//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Envelope JSON failed to parse or serialize.
    #[error("invalid envelope JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A message arrived that is not valid at this point in the session.
    #[error("unexpected message: {kind}")]
    UnexpectedMessage {
        /// The envelope type (or transport frame kind) that was received.
        kind: String,
    },
    /// The authentication proof did not match.
    #[error("unauthorized")]
    Unauthorized,
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
