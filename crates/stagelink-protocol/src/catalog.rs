//! Capability catalog (`settings` reply payload).
//!
//! The streamer regenerates this per request from its current device
//! configuration. Receivers always replace their cached copy whole; the
//! catalog is never diffed.

use serde::{Deserialize, Serialize};

/// What the device currently offers for remote control.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    /// Enabled scenes.
    pub scenes: Vec<SceneEntry>,
    /// Available microphones.
    pub mics: Vec<MicEntry>,
    /// Selectable bitrate presets.
    pub bitrate_presets: Vec<BitratePresetEntry>,
    /// Bonded-link connection priorities.
    pub connection_priorities: Vec<ConnectionPriorityEntry>,
}

/// An enabled scene.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    /// Stable scene identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// An available microphone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicEntry {
    /// Stable microphone identifier.
    pub id: String,
    /// Display name.
    pub name: String,
}

/// A selectable bitrate preset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BitratePresetEntry {
    /// Stable preset identifier.
    pub id: String,
    /// Target bitrate in bits per second.
    pub bitrate: u32,
}

/// A bonded-link connection priority row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionPriorityEntry {
    /// Stable connection identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Relative priority (higher wins).
    pub priority: i32,
    /// Whether the connection participates in bonding.
    pub enabled: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
