//! Shutdown signalling for the assistant.
//!
//! One token fans out to the axum acceptor, every live socket handler,
//! and the status poller. Stopping is two steps: cancel the token, then
//! drain the poller so an in-flight `getStatus` pull is not torn down
//! mid-request.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How long the poller gets to notice cancellation and wind down.
const POLLER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Cancellation fan-out for everything the assistant spawns.
pub struct ShutdownCoordinator {
    token: CancellationToken,
}

impl ShutdownCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// A token clone for a task that must stop on shutdown.
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Begin shutting down. Safe to call more than once.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether shutdown has begun.
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cancel the token, then wait for the poller to finish its current
    /// pull. A poller stuck past the drain window is left to die with
    /// the process.
    pub async fn drain(&self, poller: JoinHandle<()>) {
        self.shutdown();
        match tokio::time::timeout(POLLER_DRAIN_TIMEOUT, poller).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%err, "status poller task failed"),
            Err(_elapsed) => warn!("status poller did not stop within the drain window"),
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
