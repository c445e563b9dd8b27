//! Authoritative control state.

use parking_lot::Mutex;
use stagelink_protocol::ControlState;

/// Shared holder for the streamer's authoritative [`ControlState`].
///
/// The dispatcher applies a diff after each successful device call; the
/// connection loop snapshots the whole thing for the post-connect resync.
#[derive(Default)]
pub struct StateStore {
    inner: Mutex<ControlState>,
}

impl StateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a diff into the authoritative state.
    pub fn apply(&self, diff: &ControlState) {
        self.inner.lock().merge(diff);
    }

    /// Clone the full current state.
    #[must_use]
    pub fn snapshot(&self) -> ControlState {
        self.inner.lock().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        assert!(StateStore::new().snapshot().is_empty());
    }

    #[test]
    fn apply_accumulates_diffs() {
        let store = StateStore::new();
        store.apply(&ControlState {
            scene: Some("main".into()),
            ..ControlState::default()
        });
        store.apply(&ControlState {
            muted: Some(true),
            ..ControlState::default()
        });
        let snap = store.snapshot();
        assert_eq!(snap.scene.as_deref(), Some("main"));
        assert_eq!(snap.muted, Some(true));
    }

    #[test]
    fn snapshot_is_a_copy() {
        let store = StateStore::new();
        let snap = store.snapshot();
        store.apply(&ControlState {
            torch: Some(true),
            ..ControlState::default()
        });
        assert!(snap.torch.is_none());
        assert_eq!(store.snapshot().torch, Some(true));
    }
}
