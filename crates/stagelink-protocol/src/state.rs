//! Control state diffs with last-writer-wins merge.
//!
//! `ControlState` is a flat record of independently optional fields. The
//! same type serves as the streamer's authoritative full state (every
//! field populated) and as the `stateChanged` diff on the wire (only the
//! changed fields populated).
//!
//! Merge rule: a present field replaces the receiver's cached value, an
//! absent field leaves it untouched. Applying diffs in arrival order is
//! therefore exactly field-wise last-writer-wins. In practice diffs only
//! ever set values; there is no wire form that clears a field.

use serde::{Deserialize, Serialize};

/// Mirrored device state (full or diff form).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    /// Active scene identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    /// Active microphone identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mic: Option<String>,
    /// Active bitrate preset identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate_preset: Option<String>,
    /// Camera zoom level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
    /// Whether verbose device logging is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_logging: Option<bool>,
    /// Whether the device is live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streaming: Option<bool>,
    /// Whether the device is recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<bool>,
    /// Whether audio is muted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
    /// Whether the torch is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torch: Option<bool>,
}

impl ControlState {
    /// Merge `diff` into `self`: present fields replace, absent fields
    /// leave the current value untouched.
    pub fn merge(&mut self, diff: &ControlState) {
        if let Some(v) = &diff.scene {
            self.scene = Some(v.clone());
        }
        if let Some(v) = &diff.mic {
            self.mic = Some(v.clone());
        }
        if let Some(v) = &diff.bitrate_preset {
            self.bitrate_preset = Some(v.clone());
        }
        if let Some(v) = diff.zoom {
            self.zoom = Some(v);
        }
        if let Some(v) = diff.debug_logging {
            self.debug_logging = Some(v);
        }
        if let Some(v) = diff.streaming {
            self.streaming = Some(v);
        }
        if let Some(v) = diff.recording {
            self.recording = Some(v);
        }
        if let Some(v) = diff.muted {
            self.muted = Some(v);
        }
        if let Some(v) = diff.torch {
            self.torch = Some(v);
        }
    }

    /// Whether no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scene.is_none()
            && self.mic.is_none()
            && self.bitrate_preset.is_none()
            && self.zoom.is_none()
            && self.debug_logging.is_none()
            && self.streaming.is_none()
            && self.recording.is_none()
            && self.muted.is_none()
            && self.torch.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
