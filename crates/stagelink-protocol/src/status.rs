//! Status snapshot groups.
//!
//! Status is presentation-oriented telemetry, regenerated per pull. It is
//! split into three independently optional groups matching the monitoring
//! surfaces that consume them. An absent group or item means "not
//! applicable right now", never an error.

use serde::{Deserialize, Serialize};

/// Full status reply payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Device vitals and top-level flags.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<StatusGeneral>,
    /// Production context items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_left: Option<StatusTopLeft>,
    /// Transport and session health items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_right: Option<StatusTopRight>,
}

/// Device vitals group.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusGeneral {
    /// Battery charge in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_percentage: Option<i32>,
    /// Whether the device is thermally throttled or close to it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_thermal_hot: Option<bool>,
    /// Connected Wi-Fi network name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wifi_ssid: Option<String>,
    /// Whether the device is live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    /// Whether the device is recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recording: Option<bool>,
    /// Whether audio is muted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
}

/// Production context group (pre-rendered display strings).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTopLeft {
    /// Stream destination description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    /// Active camera description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    /// Active microphone description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mic: Option<String>,
    /// Zoom level description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<String>,
    /// OBS remote status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obs: Option<String>,
    /// Platform events status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<String>,
    /// Chat source status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat: Option<String>,
    /// Viewer count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewers: Option<String>,
}

/// Transport and session health group (pre-rendered display strings).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTopRight {
    /// Current audio level in dBFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_level: Option<f32>,
    /// Ingest server status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_server: Option<String>,
    /// Remote control link status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_control: Option<String>,
    /// Attached game controllers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_controllers: Option<String>,
    /// Current bitrate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    /// Stream uptime.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
    /// Location description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Bonded-link transport summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bonding: Option<String>,
    /// Current recording length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_length: Option<String>,
    /// Replay buffer state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replay: Option<String>,
    /// Browser widget count/state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_widgets: Option<String>,
    /// Relay link status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<String>,
    /// Known companion/relay devices.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
