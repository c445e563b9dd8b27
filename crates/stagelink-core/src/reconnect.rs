//! Reconnect policy for the control-plane transport.
//!
//! The streamer (and companions) recover from any transport loss by
//! waiting a fixed short delay and dialing again from scratch. There is
//! deliberately no exponential backoff: the link partner is a single
//! known peer, and a constant cadence keeps worst-case recovery bounded
//! at one delay period.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default delay between reconnect attempts in milliseconds.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 1000;
/// Default time allowed for the dial + hello handshake in milliseconds.
pub const DEFAULT_HANDSHAKE_TIMEOUT_MS: u64 = 10_000;

/// Configuration for transport reconnection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectConfig {
    /// Fixed delay between attempts in ms (default: 1000).
    #[serde(default = "default_reconnect_delay_ms")]
    pub delay_ms: u64,
    /// Timeout for the dial + authentication handshake in ms (default: 10000).
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY_MS
}
fn default_handshake_timeout_ms() -> u64 {
    DEFAULT_HANDSHAKE_TIMEOUT_MS
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            handshake_timeout_ms: DEFAULT_HANDSHAKE_TIMEOUT_MS,
        }
    }
}

impl ReconnectConfig {
    /// Delay to wait before the next attempt.
    ///
    /// The attempt index is accepted for signature stability but does not
    /// change the result: recovery runs on a fixed cadence.
    #[must_use]
    pub fn delay(&self, _attempt: u32) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Handshake timeout as a [`Duration`].
    #[must_use]
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
