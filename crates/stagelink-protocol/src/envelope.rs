//! Wire envelopes.
//!
//! Every transport message is one JSON object `{"type", "payload"}`,
//! modeled as adjacently tagged enums: [`CommandMessage`] for the
//! assistant-to-streamer direction, [`EventMessage`] for the reverse.
//!
//! Every command payload carries a `requestId`; the streamer answers each
//! with exactly one `ack` echoing it (or, for the pulls, with a `status` /
//! `settings` event echoing it). The protocol defines no failure payload:
//! a command that cannot complete simply never acks, and the caller's own
//! timeout is the failure signal.

use serde::{Deserialize, Serialize};
use stagelink_core::RequestId;

use crate::auth::Authentication;
use crate::catalog::SettingsSnapshot;
use crate::chat::ChatMessagesPayload;
use crate::errors::Result;
use crate::scene::{RemoteSceneData, RemoteSceneSettings};
use crate::state::ControlState;
use crate::status::StatusSnapshot;

/// Assistant-to-streamer envelope (commands and pulls).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum CommandMessage {
    /// Switch the active scene.
    SetScene {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Scene to activate.
        scene_id: String,
    },
    /// Switch the active microphone.
    SetMic {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Microphone to activate.
        mic_id: String,
    },
    /// Select a bitrate preset.
    SetBitratePreset {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Preset to select.
        preset_id: String,
    },
    /// Start or stop recording.
    SetRecord {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Desired recording state.
        on: bool,
    },
    /// Go live or end the stream.
    SetStream {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Desired live state.
        on: bool,
    },
    /// Set the camera zoom level. The device clamps to its real range.
    SetZoom {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Requested zoom level.
        level: f32,
    },
    /// Mute or unmute audio.
    SetMute {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Desired mute state.
        on: bool,
    },
    /// Toggle the torch.
    SetTorch {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Desired torch state.
        on: bool,
    },
    /// Toggle verbose device logging.
    SetDebugLogging {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Desired logging state.
        on: bool,
    },
    /// Reload all browser widgets.
    ReloadBrowserWidgets {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
    },
    /// Enable or disable bonded-link priorities as a whole.
    SetSrtConnectionPrioritiesEnabled {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Whether priorities apply.
        enabled: bool,
    },
    /// Reconfigure one bonded-link priority row.
    SetSrtConnectionPriority {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// Connection to reconfigure.
        priority_id: String,
        /// New relative priority.
        priority: i32,
        /// Whether the connection participates.
        enabled: bool,
    },
    /// Subscribe this assistant to preview frames.
    StartPreview {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
    },
    /// Unsubscribe this assistant from preview frames.
    StopPreview {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
    },
    /// Replace the remote scene graph. Idempotent.
    SetRemoteSceneSettings {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// The new scene graph.
        #[serde(flatten)]
        settings: RemoteSceneSettings,
    },
    /// Update live annotation data for remote scene widgets. Idempotent.
    SetRemoteSceneData {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
        /// The new annotation data.
        #[serde(flatten)]
        data: RemoteSceneData,
    },
    /// Trigger an instant replay.
    InstantReplay {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
    },
    /// Persist the replay buffer.
    SaveReplay {
        /// Correlation id echoed by the ack.
        request_id: RequestId,
    },
    /// Pull a status snapshot (replied to with a `status` event).
    GetStatus {
        /// Correlation id echoed by the reply.
        request_id: RequestId,
    },
    /// Pull the capability catalog (replied to with a `settings` event).
    GetSettings {
        /// Correlation id echoed by the reply.
        request_id: RequestId,
    },
}

impl CommandMessage {
    /// The correlation id carried by this command.
    #[must_use]
    pub fn request_id(&self) -> &RequestId {
        match self {
            Self::SetScene { request_id, .. }
            | Self::SetMic { request_id, .. }
            | Self::SetBitratePreset { request_id, .. }
            | Self::SetRecord { request_id, .. }
            | Self::SetStream { request_id, .. }
            | Self::SetZoom { request_id, .. }
            | Self::SetMute { request_id, .. }
            | Self::SetTorch { request_id, .. }
            | Self::SetDebugLogging { request_id, .. }
            | Self::ReloadBrowserWidgets { request_id }
            | Self::SetSrtConnectionPrioritiesEnabled { request_id, .. }
            | Self::SetSrtConnectionPriority { request_id, .. }
            | Self::StartPreview { request_id }
            | Self::StopPreview { request_id }
            | Self::SetRemoteSceneSettings { request_id, .. }
            | Self::SetRemoteSceneData { request_id, .. }
            | Self::InstantReplay { request_id }
            | Self::SaveReplay { request_id }
            | Self::GetStatus { request_id }
            | Self::GetSettings { request_id } => request_id,
        }
    }

    /// The wire type name (for logging and metrics labels).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetScene { .. } => "setScene",
            Self::SetMic { .. } => "setMic",
            Self::SetBitratePreset { .. } => "setBitratePreset",
            Self::SetRecord { .. } => "setRecord",
            Self::SetStream { .. } => "setStream",
            Self::SetZoom { .. } => "setZoom",
            Self::SetMute { .. } => "setMute",
            Self::SetTorch { .. } => "setTorch",
            Self::SetDebugLogging { .. } => "setDebugLogging",
            Self::ReloadBrowserWidgets { .. } => "reloadBrowserWidgets",
            Self::SetSrtConnectionPrioritiesEnabled { .. } => {
                "setSrtConnectionPrioritiesEnabled"
            }
            Self::SetSrtConnectionPriority { .. } => "setSrtConnectionPriority",
            Self::StartPreview { .. } => "startPreview",
            Self::StopPreview { .. } => "stopPreview",
            Self::SetRemoteSceneSettings { .. } => "setRemoteSceneSettings",
            Self::SetRemoteSceneData { .. } => "setRemoteSceneData",
            Self::InstantReplay { .. } => "instantReplay",
            Self::SaveReplay { .. } => "saveReplay",
            Self::GetStatus { .. } => "getStatus",
            Self::GetSettings { .. } => "getSettings",
        }
    }

    /// Serialize to the wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from the wire form.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Streamer-to-assistant envelope (acks, replies, and pushes).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum EventMessage {
    /// First envelope on every connection: the authentication proof.
    Hello {
        /// Salted-hash credentials.
        authentication: Authentication,
    },
    /// A command completed.
    Ack {
        /// The command's correlation id.
        request_id: RequestId,
    },
    /// Control state diff (only changed fields present).
    StateChanged {
        /// The diff.
        state: ControlState,
    },
    /// Reply to `getStatus`.
    Status {
        /// The pull's correlation id.
        request_id: RequestId,
        /// The snapshot groups.
        #[serde(flatten)]
        snapshot: StatusSnapshot,
    },
    /// Reply to `getSettings`.
    Settings {
        /// The pull's correlation id.
        request_id: RequestId,
        /// The capability catalog.
        #[serde(flatten)]
        snapshot: SettingsSnapshot,
    },
    /// One preview frame.
    Preview {
        /// JPEG bytes, base64 encoded.
        frame: String,
    },
    /// Live chat or replayed backlog.
    ChatMessages(ChatMessagesPayload),
    /// Opaque platform event passthrough.
    TwitchEventSubNotification {
        /// The raw platform payload.
        message: serde_json::Value,
    },
    /// A remote log line from the device.
    Log {
        /// The log text.
        text: String,
    },
}

impl EventMessage {
    /// The wire type name (for logging and metrics labels).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hello { .. } => "hello",
            Self::Ack { .. } => "ack",
            Self::StateChanged { .. } => "stateChanged",
            Self::Status { .. } => "status",
            Self::Settings { .. } => "settings",
            Self::Preview { .. } => "preview",
            Self::ChatMessages(_) => "chatMessages",
            Self::TwitchEventSubNotification { .. } => "twitchEventSubNotification",
            Self::Log { .. } => "log",
        }
    }

    /// Serialize to the wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from the wire form.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
