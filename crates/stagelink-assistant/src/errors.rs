//! Assistant error types.

use thiserror::Error;

/// Errors that can occur in the assistant role.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Listener or socket failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed or unexpected wire traffic.
    #[error("protocol error: {0}")]
    Protocol(#[from] stagelink_protocol::ProtocolError),
    /// The hello proof did not verify.
    #[error("unauthorized")]
    Unauthorized,
    /// No streamer is attached.
    #[error("streamer not connected")]
    StreamerUnavailable,
    /// The streamer never answered within the request timeout.
    #[error("request timed out")]
    RequestTimeout,
    /// The streamer answered a pull with the wrong reply kind.
    #[error("unexpected reply to {method}")]
    UnexpectedReply {
        /// The command that was issued.
        method: &'static str,
    },
    /// Companion capacity is exhausted.
    #[error("companion limit reached ({limit})")]
    CompanionLimit {
        /// The configured maximum.
        limit: usize,
    },
}

/// Result type for assistant operations.
pub type Result<T> = std::result::Result<T, AssistantError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
