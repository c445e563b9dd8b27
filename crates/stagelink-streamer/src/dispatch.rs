//! Command dispatch against the device.
//!
//! One command in, zero or more events out. Every device call runs under
//! a timeout; a call that errors or times out produces no events at all,
//! so the assistant's own request timeout is the single failure signal.

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use stagelink_core::ConnectionId;
use stagelink_protocol::{
    CommandMessage, ControlState, EventMessage, SettingsSnapshot, StatusSnapshot,
};
use tracing::warn;

use crate::delegate::StreamerDelegate;
use crate::errors::Result;
use crate::preview::{PreviewSessions, PreviewTransition};
use crate::state::StateStore;

/// What a successful device call produced.
enum Outcome {
    /// Ack only.
    Done,
    /// Ack plus a control state diff to apply and broadcast.
    Diff(ControlState),
    /// A `status` reply.
    Status(StatusSnapshot),
    /// A `settings` reply.
    Settings(SettingsSnapshot),
}

/// Executes commands against the delegate and produces wire events.
pub struct CommandDispatcher {
    delegate: Arc<dyn StreamerDelegate>,
    state: Arc<StateStore>,
    preview: Arc<PreviewSessions>,
    timeout: Duration,
}

impl CommandDispatcher {
    /// Create a dispatcher with a per-command device timeout.
    pub fn new(
        delegate: Arc<dyn StreamerDelegate>,
        state: Arc<StateStore>,
        preview: Arc<PreviewSessions>,
        timeout: Duration,
    ) -> Self {
        Self {
            delegate,
            state,
            preview,
            timeout,
        }
    }

    /// Execute one command. Returns the events to send back, in order.
    pub async fn dispatch(
        &self,
        conn: &ConnectionId,
        command: CommandMessage,
    ) -> Vec<EventMessage> {
        let name = command.name();
        let request_id = command.request_id().clone();
        counter!("streamer_commands_total", "command" => name).increment(1);

        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.run(conn, command)).await;

        let events = match result {
            Ok(Ok(Outcome::Done)) => vec![EventMessage::Ack { request_id }],
            Ok(Ok(Outcome::Diff(diff))) => {
                self.state.apply(&diff);
                vec![
                    EventMessage::Ack { request_id },
                    EventMessage::StateChanged { state: diff },
                ]
            }
            Ok(Ok(Outcome::Status(snapshot))) => vec![EventMessage::Status {
                request_id,
                snapshot,
            }],
            Ok(Ok(Outcome::Settings(snapshot))) => vec![EventMessage::Settings {
                request_id,
                snapshot,
            }],
            Ok(Err(err)) => {
                counter!("streamer_command_errors_total", "command" => name, "error_type" => "device")
                    .increment(1);
                warn!(command = name, %err, "device call failed, withholding ack");
                Vec::new()
            }
            Err(_elapsed) => {
                counter!("streamer_command_errors_total", "command" => name, "error_type" => "timeout")
                    .increment(1);
                tracing::error!(
                    command = name,
                    "device call timed out after {:?}, withholding ack",
                    self.timeout
                );
                Vec::new()
            }
        };

        let duration = start.elapsed();
        histogram!("streamer_command_duration_seconds", "command" => name)
            .record(duration.as_secs_f64());
        if duration.as_secs() >= 5 {
            warn!(
                command = name,
                duration_secs = duration.as_secs_f64(),
                "slow command"
            );
        }

        events
    }

    async fn run(&self, conn: &ConnectionId, command: CommandMessage) -> Result<Outcome> {
        match command {
            CommandMessage::SetScene { scene_id, .. } => {
                self.delegate.set_scene(&scene_id).await?;
                Ok(Outcome::Diff(ControlState {
                    scene: Some(scene_id),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetMic { mic_id, .. } => {
                self.delegate.set_mic(&mic_id).await?;
                Ok(Outcome::Diff(ControlState {
                    mic: Some(mic_id),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetBitratePreset { preset_id, .. } => {
                self.delegate.set_bitrate_preset(&preset_id).await?;
                Ok(Outcome::Diff(ControlState {
                    bitrate_preset: Some(preset_id),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetRecord { on, .. } => {
                self.delegate.set_record(on).await?;
                Ok(Outcome::Diff(ControlState {
                    recording: Some(on),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetStream { on, .. } => {
                self.delegate.set_stream(on).await?;
                Ok(Outcome::Diff(ControlState {
                    streaming: Some(on),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetZoom { level, .. } => {
                let applied = self.delegate.set_zoom(level).await?;
                Ok(Outcome::Diff(ControlState {
                    zoom: Some(applied),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetMute { on, .. } => {
                self.delegate.set_mute(on).await?;
                Ok(Outcome::Diff(ControlState {
                    muted: Some(on),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetTorch { on, .. } => {
                self.delegate.set_torch(on).await?;
                Ok(Outcome::Diff(ControlState {
                    torch: Some(on),
                    ..ControlState::default()
                }))
            }
            CommandMessage::SetDebugLogging { on, .. } => {
                self.delegate.set_debug_logging(on).await?;
                Ok(Outcome::Diff(ControlState {
                    debug_logging: Some(on),
                    ..ControlState::default()
                }))
            }
            CommandMessage::ReloadBrowserWidgets { .. } => {
                self.delegate.reload_browser_widgets().await?;
                Ok(Outcome::Done)
            }
            CommandMessage::SetSrtConnectionPrioritiesEnabled { enabled, .. } => {
                self.delegate
                    .set_srt_connection_priorities_enabled(enabled)
                    .await?;
                Ok(Outcome::Done)
            }
            CommandMessage::SetSrtConnectionPriority {
                priority_id,
                priority,
                enabled,
                ..
            } => {
                self.delegate
                    .set_srt_connection_priority(&priority_id, priority, enabled)
                    .await?;
                Ok(Outcome::Done)
            }
            CommandMessage::StartPreview { .. } => {
                if self.preview.subscribe(conn) == PreviewTransition::BecameActive {
                    self.delegate.set_preview_active(true).await?;
                }
                Ok(Outcome::Done)
            }
            CommandMessage::StopPreview { .. } => {
                if self.preview.unsubscribe(conn) == PreviewTransition::BecameIdle {
                    self.delegate.set_preview_active(false).await?;
                }
                Ok(Outcome::Done)
            }
            CommandMessage::SetRemoteSceneSettings { settings, .. } => {
                self.delegate.apply_remote_scene_settings(&settings).await?;
                Ok(Outcome::Done)
            }
            CommandMessage::SetRemoteSceneData { data, .. } => {
                self.delegate.apply_remote_scene_data(&data).await?;
                Ok(Outcome::Done)
            }
            CommandMessage::InstantReplay { .. } => {
                self.delegate.instant_replay().await?;
                Ok(Outcome::Done)
            }
            CommandMessage::SaveReplay { .. } => {
                self.delegate.save_replay().await?;
                Ok(Outcome::Done)
            }
            CommandMessage::GetStatus { .. } => Ok(Outcome::Status(self.delegate.status().await?)),
            CommandMessage::GetSettings { .. } => {
                Ok(Outcome::Settings(self.delegate.settings_snapshot().await?))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StreamerError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use stagelink_core::RequestId;
    use stagelink_protocol::scene::{RemoteScene, RemoteSceneData, RemoteSceneSettings};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    // ── Test delegate ───────────────────────────────────────────────

    #[derive(Default)]
    struct TestDelegate {
        calls: Mutex<Vec<String>>,
        fail_next: AtomicBool,
        delay: Mutex<Option<Duration>>,
        scene_graph: Mutex<Option<RemoteSceneSettings>>,
        preview_active: AtomicBool,
        preview_flips: AtomicU32,
    }

    impl TestDelegate {
        async fn pass(&self, call: &str) -> crate::errors::Result<()> {
            let delay = *self.delay.lock();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_next.swap(false, Ordering::Relaxed) {
                return Err(StreamerError::Device("unavailable".into()));
            }
            self.calls.lock().push(call.to_owned());
            Ok(())
        }
    }

    #[async_trait]
    impl StreamerDelegate for TestDelegate {
        async fn set_scene(&self, scene_id: &str) -> crate::errors::Result<()> {
            self.pass(&format!("scene:{scene_id}")).await
        }
        async fn set_mic(&self, mic_id: &str) -> crate::errors::Result<()> {
            self.pass(&format!("mic:{mic_id}")).await
        }
        async fn set_bitrate_preset(&self, preset_id: &str) -> crate::errors::Result<()> {
            self.pass(&format!("preset:{preset_id}")).await
        }
        async fn set_record(&self, on: bool) -> crate::errors::Result<()> {
            self.pass(&format!("record:{on}")).await
        }
        async fn set_stream(&self, on: bool) -> crate::errors::Result<()> {
            self.pass(&format!("stream:{on}")).await
        }
        async fn set_zoom(&self, level: f32) -> crate::errors::Result<f32> {
            self.pass("zoom").await?;
            Ok(level.clamp(1.0, 8.0))
        }
        async fn set_mute(&self, on: bool) -> crate::errors::Result<()> {
            self.pass(&format!("mute:{on}")).await
        }
        async fn set_torch(&self, on: bool) -> crate::errors::Result<()> {
            self.pass(&format!("torch:{on}")).await
        }
        async fn set_debug_logging(&self, on: bool) -> crate::errors::Result<()> {
            self.pass(&format!("debug:{on}")).await
        }
        async fn reload_browser_widgets(&self) -> crate::errors::Result<()> {
            self.pass("reload").await
        }
        async fn set_srt_connection_priorities_enabled(
            &self,
            enabled: bool,
        ) -> crate::errors::Result<()> {
            self.pass(&format!("srt-enabled:{enabled}")).await
        }
        async fn set_srt_connection_priority(
            &self,
            priority_id: &str,
            priority: i32,
            enabled: bool,
        ) -> crate::errors::Result<()> {
            self.pass(&format!("srt:{priority_id}:{priority}:{enabled}"))
                .await
        }
        async fn instant_replay(&self) -> crate::errors::Result<()> {
            self.pass("instant-replay").await
        }
        async fn save_replay(&self) -> crate::errors::Result<()> {
            self.pass("save-replay").await
        }
        async fn apply_remote_scene_settings(
            &self,
            settings: &RemoteSceneSettings,
        ) -> crate::errors::Result<()> {
            self.pass("remote-scene-settings").await?;
            *self.scene_graph.lock() = Some(settings.clone());
            Ok(())
        }
        async fn apply_remote_scene_data(
            &self,
            _data: &RemoteSceneData,
        ) -> crate::errors::Result<()> {
            self.pass("remote-scene-data").await
        }
        async fn set_preview_active(&self, active: bool) -> crate::errors::Result<()> {
            self.preview_active.store(active, Ordering::Relaxed);
            let _ = self.preview_flips.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        async fn status(&self) -> crate::errors::Result<StatusSnapshot> {
            Ok(StatusSnapshot {
                general: Some(stagelink_protocol::status::StatusGeneral {
                    battery_percentage: Some(88),
                    ..Default::default()
                }),
                ..StatusSnapshot::default()
            })
        }
        async fn settings_snapshot(&self) -> crate::errors::Result<SettingsSnapshot> {
            Ok(SettingsSnapshot::default())
        }
    }

    fn make_dispatcher() -> (Arc<TestDelegate>, Arc<StateStore>, CommandDispatcher) {
        let delegate = Arc::new(TestDelegate::default());
        let state = Arc::new(StateStore::new());
        let dispatcher = CommandDispatcher::new(
            delegate.clone(),
            state.clone(),
            Arc::new(PreviewSessions::new()),
            Duration::from_secs(10),
        );
        (delegate, state, dispatcher)
    }

    fn rid(s: &str) -> RequestId {
        RequestId::from(s)
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn set_scene_acks_and_diffs() {
        let (delegate, state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetScene {
                    request_id: rid("r1"),
                    scene_id: "irl".into(),
                },
            )
            .await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], EventMessage::Ack { request_id: rid("r1") });
        let EventMessage::StateChanged { state: diff } = &events[1] else {
            panic!("expected stateChanged");
        };
        assert_eq!(diff.scene.as_deref(), Some("irl"));
        assert!(diff.muted.is_none(), "diff must carry only the change");
        assert_eq!(state.snapshot().scene.as_deref(), Some("irl"));
        assert_eq!(delegate.calls.lock().as_slice(), ["scene:irl"]);
    }

    #[tokio::test]
    async fn zoom_diff_carries_the_clamped_level() {
        let (_delegate, state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetZoom {
                    request_id: rid("r1"),
                    level: 50.0,
                },
            )
            .await;
        let EventMessage::StateChanged { state: diff } = &events[1] else {
            panic!("expected stateChanged");
        };
        assert_eq!(diff.zoom, Some(8.0));
        assert_eq!(state.snapshot().zoom, Some(8.0));
    }

    #[tokio::test]
    async fn failed_device_call_withholds_the_ack() {
        let (delegate, state, dispatcher) = make_dispatcher();
        delegate.fail_next.store(true, Ordering::Relaxed);
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetMute {
                    request_id: rid("r1"),
                    on: true,
                },
            )
            .await;
        assert!(events.is_empty());
        assert!(state.snapshot().muted.is_none(), "no diff on failure");
    }

    #[tokio::test]
    async fn timed_out_device_call_withholds_the_ack() {
        tokio::time::pause();
        let (delegate, _state, dispatcher) = make_dispatcher();
        *delegate.delay.lock() = Some(Duration::from_secs(60));
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetTorch {
                    request_id: rid("r1"),
                    on: true,
                },
            )
            .await;
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn get_status_replies_with_the_pull_id() {
        let (_delegate, _state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::GetStatus {
                    request_id: rid("pull-1"),
                },
            )
            .await;
        assert_eq!(events.len(), 1);
        let EventMessage::Status {
            request_id,
            snapshot,
        } = &events[0]
        else {
            panic!("expected status");
        };
        assert_eq!(request_id, &rid("pull-1"));
        assert_eq!(
            snapshot.general.as_ref().unwrap().battery_percentage,
            Some(88)
        );
    }

    #[tokio::test]
    async fn get_settings_replies_with_the_catalog() {
        let (_delegate, _state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::GetSettings {
                    request_id: rid("pull-2"),
                },
            )
            .await;
        assert!(matches!(events[0], EventMessage::Settings { .. }));
    }

    #[tokio::test]
    async fn remote_scene_settings_apply_is_idempotent() {
        let (delegate, _state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let graph = RemoteSceneSettings {
            scenes: vec![RemoteScene {
                id: "rs-1".into(),
                name: "Overlay".into(),
                widget_ids: vec!["w-1".into()],
            }],
            widgets: vec![],
            selected_scene_id: Some("rs-1".into()),
        };

        let first = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetRemoteSceneSettings {
                    request_id: rid("r1"),
                    settings: graph.clone(),
                },
            )
            .await;
        let after_once = delegate.scene_graph.lock().clone();

        let second = dispatcher
            .dispatch(
                &conn,
                CommandMessage::SetRemoteSceneSettings {
                    request_id: rid("r2"),
                    settings: graph,
                },
            )
            .await;
        let after_twice = delegate.scene_graph.lock().clone();

        assert_eq!(first, vec![EventMessage::Ack { request_id: rid("r1") }]);
        assert_eq!(second, vec![EventMessage::Ack { request_id: rid("r2") }]);
        assert_eq!(after_once, after_twice);
    }

    #[tokio::test]
    async fn bare_commands_ack_without_state_change() {
        let (_delegate, state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::InstantReplay {
                    request_id: rid("r1"),
                },
            )
            .await;
        assert_eq!(events, vec![EventMessage::Ack { request_id: rid("r1") }]);
        assert!(state.snapshot().is_empty());
    }

    #[tokio::test]
    async fn preview_flips_the_delegate_only_on_edges() {
        let (delegate, _state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();

        let _ = dispatcher
            .dispatch(
                &conn,
                CommandMessage::StartPreview {
                    request_id: rid("r1"),
                },
            )
            .await;
        assert!(delegate.preview_active.load(Ordering::Relaxed));
        assert_eq!(delegate.preview_flips.load(Ordering::Relaxed), 1);

        // Duplicate start does not reach the device again.
        let _ = dispatcher
            .dispatch(
                &conn,
                CommandMessage::StartPreview {
                    request_id: rid("r2"),
                },
            )
            .await;
        assert_eq!(delegate.preview_flips.load(Ordering::Relaxed), 1);

        let _ = dispatcher
            .dispatch(
                &conn,
                CommandMessage::StopPreview {
                    request_id: rid("r3"),
                },
            )
            .await;
        assert!(!delegate.preview_active.load(Ordering::Relaxed));
        assert_eq!(delegate.preview_flips.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn stop_preview_without_subscription_still_acks() {
        let (delegate, _state, dispatcher) = make_dispatcher();
        let conn = ConnectionId::new();
        let events = dispatcher
            .dispatch(
                &conn,
                CommandMessage::StopPreview {
                    request_id: rid("r1"),
                },
            )
            .await;
        assert_eq!(events, vec![EventMessage::Ack { request_id: rid("r1") }]);
        assert_eq!(delegate.preview_flips.load(Ordering::Relaxed), 0);
    }
}
