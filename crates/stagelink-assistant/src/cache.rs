//! Mirrored streamer state.
//!
//! Two caches with deliberately different update rules: control state is
//! merged diff-by-diff (field-wise last-writer-wins), while the settings
//! catalog is replaced wholesale on every `settings` reply. The catalog
//! is regenerated on the device each time, so merging stale rows into a
//! fresh one would resurrect deleted scenes and mics.

use parking_lot::Mutex;
use stagelink_protocol::{ControlState, SettingsSnapshot};

/// Last-writer-wins mirror of the streamer's control state.
#[derive(Default)]
pub struct ControlStateCache {
    inner: Mutex<ControlState>,
}

impl ControlStateCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one `stateChanged` diff.
    pub fn apply(&self, diff: &ControlState) {
        self.inner.lock().merge(diff);
    }

    /// Clone the merged view.
    #[must_use]
    pub fn snapshot(&self) -> ControlState {
        self.inner.lock().clone()
    }
}

/// Holder for the latest capability catalog.
#[derive(Default)]
pub struct SettingsCache {
    inner: Mutex<Option<SettingsSnapshot>>,
}

impl SettingsCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole catalog.
    pub fn replace(&self, snapshot: SettingsSnapshot) {
        *self.inner.lock() = Some(snapshot);
    }

    /// Clone the latest catalog, if any reply has arrived yet.
    #[must_use]
    pub fn get(&self) -> Option<SettingsSnapshot> {
        self.inner.lock().clone()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
