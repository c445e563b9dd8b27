//! A software stand-in for the capture device.
//!
//! [`SimulatedDevice`] implements [`StreamerDelegate`] against in-memory
//! state so the streamer role can run on a desk with no camera attached.
//! Every knob behaves like the real thing at the protocol level: zoom
//! clamps to a lens range, the catalog lists a plausible rig, and status
//! reflects whatever was set.

use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use stagelink_protocol::catalog::{
    BitratePresetEntry, ConnectionPriorityEntry, MicEntry, SceneEntry,
};
use stagelink_protocol::status::{StatusGeneral, StatusTopLeft, StatusTopRight};
use stagelink_protocol::{
    RemoteSceneData, RemoteSceneSettings, SettingsSnapshot, StatusSnapshot,
};
use stagelink_streamer::{Result, StreamerDelegate, StreamerError};
use tracing::info;

/// Simulated lens range.
const ZOOM_MIN: f32 = 0.5;
const ZOOM_MAX: f32 = 8.0;

#[derive(Debug)]
struct DeviceState {
    scene_id: String,
    mic_id: String,
    bitrate_preset_id: String,
    zoom: f32,
    streaming: bool,
    recording: bool,
    muted: bool,
    torch: bool,
    debug_logging: bool,
    preview_active: bool,
    priorities: Vec<ConnectionPriorityEntry>,
    scene_graph: RemoteSceneSettings,
    scene_data: RemoteSceneData,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            scene_id: "scene-main".to_string(),
            mic_id: "mic-bottom".to_string(),
            bitrate_preset_id: "preset-auto".to_string(),
            zoom: 1.0,
            streaming: false,
            recording: false,
            muted: false,
            torch: false,
            debug_logging: false,
            preview_active: false,
            priorities: vec![
                ConnectionPriorityEntry {
                    id: "wifi".to_string(),
                    name: "WiFi".to_string(),
                    priority: 2,
                    enabled: true,
                },
                ConnectionPriorityEntry {
                    id: "cellular".to_string(),
                    name: "Cellular".to_string(),
                    priority: 1,
                    enabled: true,
                },
            ],
            scene_graph: RemoteSceneSettings::default(),
            scene_data: RemoteSceneData::default(),
        }
    }
}

/// In-memory device used by the `streamer` role when no hardware backend
/// is wired in.
pub struct SimulatedDevice {
    state: Mutex<DeviceState>,
    started_at: Instant,
}

impl SimulatedDevice {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DeviceState::default()),
            started_at: Instant::now(),
        }
    }

    /// The currently selected scene id.
    #[must_use]
    pub fn scene_id(&self) -> String {
        self.state.lock().scene_id.clone()
    }

    /// The remote scene graph last applied.
    #[must_use]
    pub fn scene_graph(&self) -> RemoteSceneSettings {
        self.state.lock().scene_graph.clone()
    }

    /// The annotation data last applied.
    #[must_use]
    pub fn scene_data(&self) -> RemoteSceneData {
        self.state.lock().scene_data.clone()
    }

    /// Whether preview capture is running.
    #[must_use]
    pub fn preview_active(&self) -> bool {
        self.state.lock().preview_active
    }

    /// Whether verbose device logging is on.
    #[must_use]
    pub fn debug_logging(&self) -> bool {
        self.state.lock().debug_logging
    }

    fn uptime_string(&self) -> String {
        let secs = self.started_at.elapsed().as_secs();
        format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamerDelegate for SimulatedDevice {
    async fn set_scene(&self, scene_id: &str) -> Result<()> {
        info!(scene_id, "sim: scene");
        self.state.lock().scene_id = scene_id.to_string();
        Ok(())
    }

    async fn set_mic(&self, mic_id: &str) -> Result<()> {
        info!(mic_id, "sim: mic");
        self.state.lock().mic_id = mic_id.to_string();
        Ok(())
    }

    async fn set_bitrate_preset(&self, preset_id: &str) -> Result<()> {
        info!(preset_id, "sim: bitrate preset");
        self.state.lock().bitrate_preset_id = preset_id.to_string();
        Ok(())
    }

    async fn set_record(&self, on: bool) -> Result<()> {
        info!(on, "sim: record");
        self.state.lock().recording = on;
        Ok(())
    }

    async fn set_stream(&self, on: bool) -> Result<()> {
        info!(on, "sim: stream");
        self.state.lock().streaming = on;
        Ok(())
    }

    async fn set_zoom(&self, level: f32) -> Result<f32> {
        let applied = level.clamp(ZOOM_MIN, ZOOM_MAX);
        info!(requested = level, applied, "sim: zoom");
        self.state.lock().zoom = applied;
        Ok(applied)
    }

    async fn set_mute(&self, on: bool) -> Result<()> {
        info!(on, "sim: mute");
        self.state.lock().muted = on;
        Ok(())
    }

    async fn set_torch(&self, on: bool) -> Result<()> {
        info!(on, "sim: torch");
        self.state.lock().torch = on;
        Ok(())
    }

    async fn set_debug_logging(&self, on: bool) -> Result<()> {
        self.state.lock().debug_logging = on;
        Ok(())
    }

    async fn reload_browser_widgets(&self) -> Result<()> {
        info!("sim: reload browser widgets");
        Ok(())
    }

    async fn set_srt_connection_priorities_enabled(&self, enabled: bool) -> Result<()> {
        info!(enabled, "sim: connection priorities");
        for row in &mut self.state.lock().priorities {
            row.enabled = enabled;
        }
        Ok(())
    }

    async fn set_srt_connection_priority(
        &self,
        priority_id: &str,
        priority: i32,
        enabled: bool,
    ) -> Result<()> {
        let mut state = self.state.lock();
        let row = state
            .priorities
            .iter_mut()
            .find(|row| row.id == priority_id)
            .ok_or_else(|| {
                StreamerError::Device(format!("unknown connection priority: {priority_id}"))
            })?;
        row.priority = priority;
        row.enabled = enabled;
        Ok(())
    }

    async fn instant_replay(&self) -> Result<()> {
        info!("sim: instant replay");
        Ok(())
    }

    async fn save_replay(&self) -> Result<()> {
        info!("sim: save replay");
        Ok(())
    }

    async fn apply_remote_scene_settings(&self, settings: &RemoteSceneSettings) -> Result<()> {
        let mut state = self.state.lock();
        state.scene_graph = settings.clone();
        if let Some(selected) = &settings.selected_scene_id {
            state.scene_id = selected.clone();
        }
        Ok(())
    }

    async fn apply_remote_scene_data(&self, data: &RemoteSceneData) -> Result<()> {
        self.state.lock().scene_data = data.clone();
        Ok(())
    }

    async fn set_preview_active(&self, active: bool) -> Result<()> {
        info!(active, "sim: preview capture");
        self.state.lock().preview_active = active;
        Ok(())
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        let state = self.state.lock();
        Ok(StatusSnapshot {
            general: Some(StatusGeneral {
                battery_percentage: Some(100),
                is_thermal_hot: Some(false),
                wifi_ssid: Some("simulated".to_string()),
                is_live: Some(state.streaming),
                is_recording: Some(state.recording),
                is_muted: Some(state.muted),
            }),
            top_left: Some(StatusTopLeft {
                camera: Some(if state.torch {
                    "Simulated Camera (torch)".to_string()
                } else {
                    "Simulated Camera".to_string()
                }),
                mic: Some(state.mic_id.clone()),
                zoom: Some(format!("{:.1}x", state.zoom)),
                ..StatusTopLeft::default()
            }),
            top_right: Some(StatusTopRight {
                bitrate: Some(state.bitrate_preset_id.clone()),
                uptime: Some(self.uptime_string()),
                ..StatusTopRight::default()
            }),
        })
    }

    async fn settings_snapshot(&self) -> Result<SettingsSnapshot> {
        let state = self.state.lock();
        Ok(SettingsSnapshot {
            scenes: vec![
                SceneEntry {
                    id: "scene-main".to_string(),
                    name: "Main".to_string(),
                },
                SceneEntry {
                    id: "scene-irl".to_string(),
                    name: "IRL".to_string(),
                },
            ],
            mics: vec![
                MicEntry {
                    id: "mic-bottom".to_string(),
                    name: "Bottom".to_string(),
                },
                MicEntry {
                    id: "mic-front".to_string(),
                    name: "Front".to_string(),
                },
            ],
            bitrate_presets: vec![
                BitratePresetEntry {
                    id: "preset-auto".to_string(),
                    bitrate: 0,
                },
                BitratePresetEntry {
                    id: "preset-high".to_string(),
                    bitrate: 6_000_000,
                },
            ],
            connection_priorities: state.priorities.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
