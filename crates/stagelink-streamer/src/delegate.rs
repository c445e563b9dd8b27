//! The device boundary.
//!
//! [`StreamerDelegate`] is the seam between the control plane and the
//! actual capture hardware. The connection loop never touches the camera,
//! encoder, or bonded links directly; it calls the delegate and reports
//! the outcome on the wire. A delegate method that returns an error (or
//! never returns) results in no ack, which the assistant surfaces as a
//! timeout.

use async_trait::async_trait;
use stagelink_protocol::{RemoteSceneData, RemoteSceneSettings, SettingsSnapshot, StatusSnapshot};

use crate::errors::Result;

/// Operations the device must provide to the control plane.
#[async_trait]
pub trait StreamerDelegate: Send + Sync {
    /// Switch the active scene.
    async fn set_scene(&self, scene_id: &str) -> Result<()>;

    /// Switch the active microphone.
    async fn set_mic(&self, mic_id: &str) -> Result<()>;

    /// Select a bitrate preset.
    async fn set_bitrate_preset(&self, preset_id: &str) -> Result<()>;

    /// Start or stop recording.
    async fn set_record(&self, on: bool) -> Result<()>;

    /// Go live or end the stream.
    async fn set_stream(&self, on: bool) -> Result<()>;

    /// Set the camera zoom. Returns the level actually applied after
    /// clamping to the lens range.
    async fn set_zoom(&self, level: f32) -> Result<f32>;

    /// Mute or unmute audio.
    async fn set_mute(&self, on: bool) -> Result<()>;

    /// Toggle the torch.
    async fn set_torch(&self, on: bool) -> Result<()>;

    /// Toggle verbose device logging.
    async fn set_debug_logging(&self, on: bool) -> Result<()>;

    /// Reload all browser widgets.
    async fn reload_browser_widgets(&self) -> Result<()>;

    /// Enable or disable bonded-link priorities as a whole.
    async fn set_srt_connection_priorities_enabled(&self, enabled: bool) -> Result<()>;

    /// Reconfigure one bonded-link priority row.
    async fn set_srt_connection_priority(
        &self,
        priority_id: &str,
        priority: i32,
        enabled: bool,
    ) -> Result<()>;

    /// Trigger an instant replay.
    async fn instant_replay(&self) -> Result<()>;

    /// Persist the replay buffer.
    async fn save_replay(&self) -> Result<()>;

    /// Replace the remote scene graph. Applying the same graph twice must
    /// leave the device in the same state as applying it once.
    async fn apply_remote_scene_settings(&self, settings: &RemoteSceneSettings) -> Result<()>;

    /// Update live annotation data for remote scene widgets.
    async fn apply_remote_scene_data(&self, data: &RemoteSceneData) -> Result<()>;

    /// Start or stop preview frame capture.
    async fn set_preview_active(&self, active: bool) -> Result<()>;

    /// Collect a full status snapshot.
    async fn status(&self) -> Result<StatusSnapshot>;

    /// Collect the capability catalog.
    async fn settings_snapshot(&self) -> Result<SettingsSnapshot>;
}
