//! In-flight request correlation.
//!
//! Every issued command registers a oneshot keyed by its request id. The
//! socket reader completes it when the matching ack or reply arrives. A
//! request that is never completed fails through the caller's timeout or
//! through channel closure when the link detaches. Completion is
//! at-most-once; a second completion for the same id finds nothing.

use dashmap::DashMap;
use stagelink_core::RequestId;
use stagelink_protocol::{SettingsSnapshot, StatusSnapshot};
use tokio::sync::oneshot;

/// What the streamer sent back for a request id.
#[derive(Debug)]
pub enum CommandReply {
    /// Bare completion of a mutating command.
    Ack,
    /// Reply to `getStatus`.
    Status(StatusSnapshot),
    /// Reply to `getSettings`.
    Settings(SettingsSnapshot),
}

/// Table of in-flight requests awaiting their reply.
#[derive(Default)]
pub struct PendingRequests {
    inflight: DashMap<String, oneshot::Sender<CommandReply>>,
}

impl PendingRequests {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a request id and get the receiver its reply will arrive on.
    pub fn register(&self, id: &RequestId) -> oneshot::Receiver<CommandReply> {
        let (tx, rx) = oneshot::channel();
        let _ = self.inflight.insert(id.as_str().to_owned(), tx);
        rx
    }

    /// Complete a request. Returns `false` when the id is unknown
    /// (already completed, timed out, or never ours).
    pub fn complete(&self, id: &str, reply: CommandReply) -> bool {
        match self.inflight.remove(id) {
            Some((_, tx)) => tx.send(reply).is_ok(),
            None => false,
        }
    }

    /// Forget a request the caller gave up on.
    pub fn forget(&self, id: &RequestId) {
        let _ = self.inflight.remove(id.as_str());
    }

    /// Drop every in-flight request. Their receivers observe closure.
    pub fn abandon_all(&self) {
        self.inflight.clear();
    }

    /// Number of requests currently awaiting a reply.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    /// Whether no request is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
