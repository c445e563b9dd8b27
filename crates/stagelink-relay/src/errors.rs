//! Relay error types.

use thiserror::Error;

/// Errors that can occur while bridging.
#[derive(Debug, Error)]
pub enum RelayError {
    /// WebSocket transport failure on either leg.
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),
    /// One leg closed, which tears down the bridge.
    #[error("{side} leg closed")]
    LegClosed {
        /// Which leg went away.
        side: &'static str,
    },
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leg_closed_display() {
        let err = RelayError::LegClosed { side: "assistant" };
        assert_eq!(err.to_string(), "assistant leg closed");
    }
}
