//! The typed command surface over the streamer socket.
//!
//! `StreamerLink` owns the outbound half of whichever streamer connection
//! is currently attached, plus the in-flight request table. Callers get
//! typed methods; each one serializes a command, waits for its correlated
//! ack or reply, and fails through the request timeout if the streamer
//! never answers.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use parking_lot::Mutex;
use stagelink_core::RequestId;
use stagelink_protocol::{
    CommandMessage, RemoteSceneData, RemoteSceneSettings, SettingsSnapshot, StatusSnapshot,
};
use tokio::sync::mpsc;

use crate::errors::{AssistantError, Result};
use crate::pending::{CommandReply, PendingRequests};

/// Issues commands to the attached streamer and correlates replies.
pub struct StreamerLink {
    outbound: Mutex<Option<mpsc::Sender<Arc<String>>>>,
    pending: PendingRequests,
    timeout: Duration,
}

impl StreamerLink {
    /// Create a detached link with the given request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            outbound: Mutex::new(None),
            pending: PendingRequests::new(),
            timeout,
        }
    }

    /// Attach a freshly authenticated streamer connection. Any previous
    /// connection's in-flight requests are abandoned.
    pub fn attach(&self, tx: mpsc::Sender<Arc<String>>) {
        let previous = self.outbound.lock().replace(tx);
        if previous.is_some() {
            self.pending.abandon_all();
        }
    }

    /// Detach the connection that owns `tx` and abandon everything in
    /// flight. A no-op when `tx` has already been superseded by a newer
    /// attach, so a lingering half-open socket winding down late cannot
    /// tear down its live successor.
    pub fn detach(&self, tx: &mpsc::Sender<Arc<String>>) {
        {
            let mut outbound = self.outbound.lock();
            match outbound.as_ref() {
                Some(current) if current.same_channel(tx) => {
                    let _ = outbound.take();
                }
                _ => return,
            }
        }
        self.pending.abandon_all();
    }

    /// Whether a streamer is currently attached.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.outbound.lock().is_some()
    }

    /// Route an ack or reply to its waiting request. Returns `false`
    /// when nothing was waiting for this id.
    pub fn complete(&self, request_id: &str, reply: CommandReply) -> bool {
        self.pending.complete(request_id, reply)
    }

    /// Number of requests currently awaiting a reply.
    #[must_use]
    pub fn inflight(&self) -> usize {
        self.pending.len()
    }

    async fn request(&self, command: CommandMessage) -> Result<CommandReply> {
        let method = command.name();
        counter!("assistant_requests_total", "method" => method).increment(1);

        let Some(tx) = self.outbound.lock().clone() else {
            return Err(AssistantError::StreamerUnavailable);
        };
        let request_id = command.request_id().clone();
        let rx = self.pending.register(&request_id);
        let json = command.to_json()?;

        if tx.send(Arc::new(json)).await.is_err() {
            self.pending.forget(&request_id);
            return Err(AssistantError::StreamerUnavailable);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_closed)) => Err(AssistantError::StreamerUnavailable),
            Err(_elapsed) => {
                self.pending.forget(&request_id);
                counter!("assistant_request_timeouts_total", "method" => method).increment(1);
                Err(AssistantError::RequestTimeout)
            }
        }
    }

    async fn command(&self, command: CommandMessage) -> Result<()> {
        let method = command.name();
        match self.request(command).await? {
            CommandReply::Ack => Ok(()),
            CommandReply::Status(_) | CommandReply::Settings(_) => {
                Err(AssistantError::UnexpectedReply { method })
            }
        }
    }

    // ── Typed commands ──────────────────────────────────────────────

    /// Switch the active scene.
    pub async fn set_scene(&self, scene_id: impl Into<String>) -> Result<()> {
        self.command(CommandMessage::SetScene {
            request_id: RequestId::new(),
            scene_id: scene_id.into(),
        })
        .await
    }

    /// Switch the active microphone.
    pub async fn set_mic(&self, mic_id: impl Into<String>) -> Result<()> {
        self.command(CommandMessage::SetMic {
            request_id: RequestId::new(),
            mic_id: mic_id.into(),
        })
        .await
    }

    /// Select a bitrate preset.
    pub async fn set_bitrate_preset(&self, preset_id: impl Into<String>) -> Result<()> {
        self.command(CommandMessage::SetBitratePreset {
            request_id: RequestId::new(),
            preset_id: preset_id.into(),
        })
        .await
    }

    /// Start or stop recording.
    pub async fn set_record(&self, on: bool) -> Result<()> {
        self.command(CommandMessage::SetRecord {
            request_id: RequestId::new(),
            on,
        })
        .await
    }

    /// Go live or end the stream.
    pub async fn set_stream(&self, on: bool) -> Result<()> {
        self.command(CommandMessage::SetStream {
            request_id: RequestId::new(),
            on,
        })
        .await
    }

    /// Set the camera zoom level.
    pub async fn set_zoom(&self, level: f32) -> Result<()> {
        self.command(CommandMessage::SetZoom {
            request_id: RequestId::new(),
            level,
        })
        .await
    }

    /// Mute or unmute audio.
    pub async fn set_mute(&self, on: bool) -> Result<()> {
        self.command(CommandMessage::SetMute {
            request_id: RequestId::new(),
            on,
        })
        .await
    }

    /// Toggle the torch.
    pub async fn set_torch(&self, on: bool) -> Result<()> {
        self.command(CommandMessage::SetTorch {
            request_id: RequestId::new(),
            on,
        })
        .await
    }

    /// Toggle verbose device logging.
    pub async fn set_debug_logging(&self, on: bool) -> Result<()> {
        self.command(CommandMessage::SetDebugLogging {
            request_id: RequestId::new(),
            on,
        })
        .await
    }

    /// Reload all browser widgets.
    pub async fn reload_browser_widgets(&self) -> Result<()> {
        self.command(CommandMessage::ReloadBrowserWidgets {
            request_id: RequestId::new(),
        })
        .await
    }

    /// Enable or disable bonded-link priorities as a whole.
    pub async fn set_srt_connection_priorities_enabled(&self, enabled: bool) -> Result<()> {
        self.command(CommandMessage::SetSrtConnectionPrioritiesEnabled {
            request_id: RequestId::new(),
            enabled,
        })
        .await
    }

    /// Reconfigure one bonded-link priority row.
    pub async fn set_srt_connection_priority(
        &self,
        priority_id: impl Into<String>,
        priority: i32,
        enabled: bool,
    ) -> Result<()> {
        self.command(CommandMessage::SetSrtConnectionPriority {
            request_id: RequestId::new(),
            priority_id: priority_id.into(),
            priority,
            enabled,
        })
        .await
    }

    /// Subscribe to preview frames.
    pub async fn start_preview(&self) -> Result<()> {
        self.command(CommandMessage::StartPreview {
            request_id: RequestId::new(),
        })
        .await
    }

    /// Unsubscribe from preview frames.
    pub async fn stop_preview(&self) -> Result<()> {
        self.command(CommandMessage::StopPreview {
            request_id: RequestId::new(),
        })
        .await
    }

    /// Replace the remote scene graph.
    pub async fn set_remote_scene_settings(&self, settings: RemoteSceneSettings) -> Result<()> {
        self.command(CommandMessage::SetRemoteSceneSettings {
            request_id: RequestId::new(),
            settings,
        })
        .await
    }

    /// Update live annotation data for remote scene widgets.
    pub async fn set_remote_scene_data(&self, data: RemoteSceneData) -> Result<()> {
        self.command(CommandMessage::SetRemoteSceneData {
            request_id: RequestId::new(),
            data,
        })
        .await
    }

    /// Trigger an instant replay.
    pub async fn instant_replay(&self) -> Result<()> {
        self.command(CommandMessage::InstantReplay {
            request_id: RequestId::new(),
        })
        .await
    }

    /// Persist the replay buffer.
    pub async fn save_replay(&self) -> Result<()> {
        self.command(CommandMessage::SaveReplay {
            request_id: RequestId::new(),
        })
        .await
    }

    // ── Pulls ───────────────────────────────────────────────────────

    /// Pull a full status snapshot.
    pub async fn get_status(&self) -> Result<StatusSnapshot> {
        match self
            .request(CommandMessage::GetStatus {
                request_id: RequestId::new(),
            })
            .await?
        {
            CommandReply::Status(snapshot) => Ok(snapshot),
            CommandReply::Ack | CommandReply::Settings(_) => {
                Err(AssistantError::UnexpectedReply {
                    method: "getStatus",
                })
            }
        }
    }

    /// Pull the capability catalog.
    pub async fn get_settings(&self) -> Result<SettingsSnapshot> {
        match self
            .request(CommandMessage::GetSettings {
                request_id: RequestId::new(),
            })
            .await?
        {
            CommandReply::Settings(snapshot) => Ok(snapshot),
            CommandReply::Ack | CommandReply::Status(_) => Err(AssistantError::UnexpectedReply {
                method: "getSettings",
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
