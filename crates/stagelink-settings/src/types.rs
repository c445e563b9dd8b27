//! Typed settings for the three roles.

use serde::{Deserialize, Serialize};
use stagelink_core::ReconnectConfig;

/// Root settings document (`~/.stagelink/settings.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StagelinkSettings {
    /// Streamer role settings.
    pub streamer: StreamerSettings,
    /// Assistant role settings.
    pub assistant: AssistantSettings,
    /// Relay bridge settings.
    pub relay: RelaySettings,
    /// Minimum log level when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for StagelinkSettings {
    fn default() -> Self {
        Self {
            streamer: StreamerSettings::default(),
            assistant: AssistantSettings::default(),
            relay: RelaySettings::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Streamer role settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamerSettings {
    /// Assistant WebSocket URL to dial.
    pub assistant_url: String,
    /// Shared control-plane password.
    pub password: String,
    /// Transport reconnect policy.
    pub reconnect: ReconnectConfig,
    /// Maximum chat messages kept for history replay.
    pub chat_backlog_limit: usize,
    /// Preview capture frame rate.
    pub preview_fps: u32,
    /// Per-command delegate timeout in milliseconds.
    pub command_timeout_ms: u64,
}

impl Default for StreamerSettings {
    fn default() -> Self {
        Self {
            assistant_url: "ws://127.0.0.1:2345/ws".to_string(),
            password: String::new(),
            reconnect: ReconnectConfig::default(),
            chat_backlog_limit: 50,
            preview_fps: 5,
            command_timeout_ms: 10_000,
        }
    }
}

/// Assistant role settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantSettings {
    /// Bind address.
    pub host: String,
    /// Listen port (`0` auto-assigns, used by tests).
    pub port: u16,
    /// Shared control-plane password.
    pub password: String,
    /// `getStatus` poll cadence in milliseconds while active.
    pub status_poll_interval_ms: u64,
    /// How long a command waits for its ack or reply in milliseconds.
    pub request_timeout_ms: u64,
    /// Companions receive every Nth preview frame.
    pub companion_preview_divisor: u32,
    /// Maximum concurrent companion connections.
    pub max_companions: usize,
    /// Companion heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Companion heartbeat timeout in seconds.
    pub heartbeat_timeout_secs: u64,
    /// Maximum chat messages kept in the assistant log.
    pub chat_log_limit: usize,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2345,
            password: String::new(),
            status_poll_interval_ms: 1000,
            request_timeout_ms: 10_000,
            companion_preview_divisor: 3,
            max_companions: 10,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            chat_log_limit: 250,
        }
    }
}

/// Relay bridge settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelaySettings {
    /// Public rendezvous base URL (the bridge id is appended to the path).
    pub rendezvous_url: String,
    /// Bridge rendezvous slot identifier.
    pub bridge_id: String,
    /// Local assistant WebSocket URL to pipe into.
    pub assistant_url: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            rendezvous_url: "wss://relay.example.org/bridge".to_string(),
            bridge_id: String::new(),
            assistant_url: "ws://127.0.0.1:2345/ws".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
