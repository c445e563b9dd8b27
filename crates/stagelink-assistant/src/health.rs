//! Health check endpoint payload.

use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always "ok" when the process is serving.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Whether a streamer is currently attached.
    pub streamer_connected: bool,
    /// Number of connected companions.
    pub companions: usize,
}

/// Build a health response.
#[must_use]
pub fn health_check(
    start_time: Instant,
    streamer_connected: bool,
    companions: usize,
) -> HealthResponse {
    HealthResponse {
        status: "ok".to_owned(),
        uptime_secs: start_time.elapsed().as_secs(),
        streamer_connected,
        companions,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_ok() {
        let resp = health_check(Instant::now(), false, 0);
        assert_eq!(resp.status, "ok");
        assert!(!resp.streamer_connected);
        assert_eq!(resp.companions, 0);
    }

    #[test]
    fn serializes_all_fields() {
        let resp = health_check(Instant::now(), true, 2);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["streamer_connected"], true);
        assert_eq!(json["companions"], 2);
        assert!(json["uptime_secs"].is_number());
    }
}
