//! Companion fan-out.
//!
//! Companions are wearable-class consumers on `/companion`: they get the
//! derived summary, chat, state diffs, and a thinned stream of preview
//! frames. Each companion has its own bounded send queue; a slow
//! companion drops its own messages and never stalls the streamer link
//! or its peers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use dashmap::DashMap;
use metrics::counter;
use serde::{Deserialize, Serialize};
use stagelink_core::ConnectionId;
use stagelink_protocol::{ChatMessagesPayload, ControlState, StatusSnapshot};
use tokio::sync::mpsc;
use tracing::debug;

use crate::errors::{AssistantError, Result};

/// Wire envelope for the companion socket.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum CompanionMessage {
    /// Periodic low-bandwidth status digest.
    Summary {
        /// The digest.
        summary: CompanionSummary,
    },
    /// One thinned preview frame.
    Preview {
        /// JPEG bytes, base64 encoded.
        frame: String,
    },
    /// Chat catch-up or live delivery.
    ChatMessages(ChatMessagesPayload),
    /// Mirrored control state (full on join, diffs after).
    StateChanged {
        /// The state or diff.
        state: ControlState,
    },
}

/// What a companion needs to render its glanceable view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanionSummary {
    /// Whether the device reports thermal pressure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_thermal_hot: Option<bool>,
    /// Whether the device is live.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    /// Whether the device is recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recording: Option<bool>,
    /// Whether audio is muted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_muted: Option<bool>,
    /// Camera zoom level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f32>,
    /// Active scene identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    /// Human-readable bitrate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<String>,
    /// Human-readable recording length.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording_length: Option<String>,
    /// Current audio level in dBFS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_level: Option<f32>,
}

impl CompanionSummary {
    /// Derive the digest from the latest status snapshot and the mirrored
    /// control state.
    #[must_use]
    pub fn derive(status: &StatusSnapshot, state: &ControlState) -> Self {
        let general = status.general.as_ref();
        let top_right = status.top_right.as_ref();
        Self {
            is_thermal_hot: general.and_then(|g| g.is_thermal_hot),
            is_live: general.and_then(|g| g.is_live),
            is_recording: general.and_then(|g| g.is_recording),
            is_muted: general.and_then(|g| g.is_muted),
            zoom: state.zoom,
            scene: state.scene.clone(),
            bitrate: top_right.and_then(|t| t.bitrate.clone()),
            recording_length: top_right.and_then(|t| t.recording_length.clone()),
            audio_level: top_right.and_then(|t| t.audio_level),
        }
    }
}

/// One connected companion.
pub struct CompanionConnection {
    /// Unique connection id.
    pub id: ConnectionId,
    tx: mpsc::Sender<Arc<String>>,
    /// When this companion connected.
    pub connected_at: Instant,
    is_alive: AtomicBool,
    dropped_messages: AtomicU64,
}

impl CompanionConnection {
    /// Create a connection around its write-task channel.
    #[must_use]
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Arc<String>>) -> Self {
        Self {
            id,
            tx,
            connected_at: Instant::now(),
            is_alive: AtomicBool::new(true),
            dropped_messages: AtomicU64::new(0),
        }
    }

    /// Queue a message. Returns `false` and counts a drop when the
    /// queue is full or the writer is gone.
    pub fn send(&self, message: Arc<String>) -> bool {
        if self.tx.try_send(message).is_ok() {
            true
        } else {
            let _ = self.dropped_messages.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Total messages dropped for this companion.
    #[must_use]
    pub fn drop_count(&self) -> u64 {
        self.dropped_messages.load(Ordering::Relaxed)
    }

    /// Mark the companion as alive (pong received).
    pub fn mark_alive(&self) {
        self.is_alive.store(true, Ordering::Relaxed);
    }

    /// Check and reset the alive flag for the heartbeat.
    pub fn check_alive(&self) -> bool {
        self.is_alive.swap(false, Ordering::Relaxed)
    }
}

/// Registry of connected companions.
pub struct CompanionManager {
    companions: DashMap<ConnectionId, Arc<CompanionConnection>>,
    max_companions: usize,
    preview_divisor: u32,
    frame_counter: AtomicU64,
}

impl CompanionManager {
    /// Create a manager with a connection cap and a preview divisor.
    #[must_use]
    pub fn new(max_companions: usize, preview_divisor: u32) -> Self {
        Self {
            companions: DashMap::new(),
            max_companions,
            preview_divisor: preview_divisor.max(1),
            frame_counter: AtomicU64::new(0),
        }
    }

    /// Register a companion, enforcing the cap.
    pub fn register(&self, connection: Arc<CompanionConnection>) -> Result<()> {
        if self.companions.len() >= self.max_companions {
            return Err(AssistantError::CompanionLimit {
                limit: self.max_companions,
            });
        }
        let _ = self.companions.insert(connection.id.clone(), connection);
        counter!("companion_connections_total").increment(1);
        Ok(())
    }

    /// Remove a companion.
    pub fn unregister(&self, id: &ConnectionId) {
        let _ = self.companions.remove(id);
    }

    /// Look up a companion by id.
    #[must_use]
    pub fn get(&self, id: &ConnectionId) -> Option<Arc<CompanionConnection>> {
        self.companions.get(id).map(|entry| entry.value().clone())
    }

    /// Number of connected companions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.companions.len()
    }

    /// Serialize once, queue to everyone.
    pub fn broadcast(&self, message: &CompanionMessage) {
        let json = match serde_json::to_string(message) {
            Ok(json) => Arc::new(json),
            Err(err) => {
                debug!(%err, "failed to serialize companion message");
                return;
            }
        };
        for entry in &self.companions {
            if !entry.value().send(json.clone()) {
                counter!("companion_dropped_messages_total").increment(1);
            }
        }
    }

    /// Forward a preview frame, thinned to every Nth.
    pub fn on_preview_frame(&self, frame: &str) {
        let n = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        if n % u64::from(self.preview_divisor) != 0 {
            return;
        }
        if self.companions.is_empty() {
            return;
        }
        self.broadcast(&CompanionMessage::Preview {
            frame: frame.to_owned(),
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_protocol::status::{StatusGeneral, StatusTopRight};

    fn make_companion() -> (Arc<CompanionConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(8);
        (Arc::new(CompanionConnection::new(ConnectionId::new(), tx)), rx)
    }

    #[test]
    fn register_enforces_the_cap() {
        let manager = CompanionManager::new(1, 3);
        let (first, _rx1) = make_companion();
        let (second, _rx2) = make_companion();
        manager.register(first).unwrap();
        assert!(matches!(
            manager.register(second),
            Err(AssistantError::CompanionLimit { limit: 1 })
        ));
        assert_eq!(manager.count(), 1);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_companion() {
        let manager = CompanionManager::new(4, 3);
        let (a, mut rx_a) = make_companion();
        let (b, mut rx_b) = make_companion();
        manager.register(a).unwrap();
        manager.register(b).unwrap();

        manager.broadcast(&CompanionMessage::StateChanged {
            state: ControlState {
                muted: Some(true),
                ..ControlState::default()
            },
        });

        for rx in [&mut rx_a, &mut rx_b] {
            let json = rx.recv().await.unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed["type"], "stateChanged");
            assert_eq!(parsed["payload"]["state"]["muted"], true);
        }
    }

    #[tokio::test]
    async fn slow_companion_drops_without_blocking() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = Arc::new(CompanionConnection::new(ConnectionId::new(), tx));
        assert!(conn.send(Arc::new("one".into())));
        assert!(!conn.send(Arc::new("two".into())), "queue is full");
        assert_eq!(conn.drop_count(), 1);
    }

    #[tokio::test]
    async fn preview_frames_are_thinned_by_the_divisor() {
        let manager = CompanionManager::new(4, 3);
        let (conn, mut rx) = make_companion();
        manager.register(conn).unwrap();

        for i in 0..6 {
            manager.on_preview_frame(&format!("frame{i}"));
        }
        drop(manager);

        let mut delivered = Vec::new();
        while let Some(json) = rx.recv().await {
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            delivered.push(parsed["payload"]["frame"].as_str().unwrap().to_owned());
        }
        assert_eq!(delivered, vec!["frame0", "frame3"]);
    }

    #[test]
    fn unregister_removes_the_companion() {
        let manager = CompanionManager::new(4, 1);
        let (conn, _rx) = make_companion();
        let id = conn.id.clone();
        manager.register(conn).unwrap();
        manager.unregister(&id);
        assert_eq!(manager.count(), 0);
        assert!(manager.get(&id).is_none());
    }

    #[test]
    fn alive_flag_checks_and_resets() {
        let (conn, _rx) = make_companion();
        assert!(conn.check_alive());
        assert!(!conn.check_alive());
        conn.mark_alive();
        assert!(conn.check_alive());
    }

    #[test]
    fn summary_derivation_pulls_from_both_sources() {
        let status = StatusSnapshot {
            general: Some(StatusGeneral {
                is_thermal_hot: Some(true),
                is_live: Some(true),
                is_recording: Some(false),
                is_muted: Some(false),
                ..Default::default()
            }),
            top_right: Some(StatusTopRight {
                bitrate: Some("5.2 Mbps".into()),
                recording_length: Some("0:42:10".into()),
                audio_level: Some(-18.5),
                ..Default::default()
            }),
            ..StatusSnapshot::default()
        };
        let state = ControlState {
            scene: Some("irl".into()),
            zoom: Some(2.0),
            ..ControlState::default()
        };

        let summary = CompanionSummary::derive(&status, &state);
        assert_eq!(summary.is_thermal_hot, Some(true));
        assert_eq!(summary.is_live, Some(true));
        assert_eq!(summary.scene.as_deref(), Some("irl"));
        assert_eq!(summary.zoom, Some(2.0));
        assert_eq!(summary.bitrate.as_deref(), Some("5.2 Mbps"));
        assert_eq!(summary.audio_level, Some(-18.5));
    }

    #[test]
    fn summary_of_empty_sources_serializes_empty() {
        let summary =
            CompanionSummary::derive(&StatusSnapshot::default(), &ControlState::default());
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, "{}");
    }
}
