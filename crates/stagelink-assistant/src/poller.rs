//! Fixed-cadence status polling.
//!
//! Status is pull-only on the wire, so the assistant polls `getStatus`
//! while anything is watching (panel open or a companion attached) and
//! stops within one cycle of the last watcher leaving. Each successful
//! poll refreshes the latest-snapshot watch and pushes a derived
//! [`CompanionSummary`] to the companions.

use std::sync::Arc;
use std::time::Duration;

use stagelink_protocol::StatusSnapshot;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::ControlStateCache;
use crate::companion::{CompanionManager, CompanionMessage, CompanionSummary};
use crate::link::StreamerLink;

/// Control handle for a running poller.
#[derive(Clone)]
pub struct PollerHandle {
    active: watch::Sender<bool>,
    latest: watch::Receiver<Option<StatusSnapshot>>,
}

impl PollerHandle {
    /// Start or stop polling. Deactivation takes effect within one cycle.
    pub fn set_active(&self, active: bool) {
        let _ = self.active.send(active);
    }

    /// The most recent successfully fetched snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.latest.borrow().clone()
    }
}

/// Polls `getStatus` on a fixed cadence while active.
pub struct StatusPoller {
    link: Arc<StreamerLink>,
    companions: Arc<CompanionManager>,
    state: Arc<ControlStateCache>,
    interval: Duration,
    active: watch::Receiver<bool>,
    latest: watch::Sender<Option<StatusSnapshot>>,
}

impl StatusPoller {
    /// Create a poller (initially inactive) and its control handle.
    #[must_use]
    pub fn new(
        link: Arc<StreamerLink>,
        companions: Arc<CompanionManager>,
        state: Arc<ControlStateCache>,
        interval: Duration,
    ) -> (Self, PollerHandle) {
        let (active_tx, active_rx) = watch::channel(false);
        let (latest_tx, latest_rx) = watch::channel(None);
        (
            Self {
                link,
                companions,
                state,
                interval,
                active: active_rx,
                latest: latest_tx,
            },
            PollerHandle {
                active: active_tx,
                latest: latest_rx,
            },
        )
    }

    /// Run until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = shutdown.cancelled() => return,
                _ = ticker.tick() => {
                    if !*self.active.borrow() {
                        continue;
                    }
                    match self.link.get_status().await {
                        Ok(snapshot) => {
                            let summary =
                                CompanionSummary::derive(&snapshot, &self.state.snapshot());
                            let _ = self.latest.send(Some(snapshot));
                            if self.companions.count() > 0 {
                                self.companions
                                    .broadcast(&CompanionMessage::Summary { summary });
                            }
                        }
                        Err(err) => debug!(%err, "status poll failed"),
                    }
                }
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
    use crate::companion::CompanionConnection;
    use crate::pending::CommandReply;
    use stagelink_core::ConnectionId;
    use stagelink_protocol::CommandMessage;
    use stagelink_protocol::status::StatusGeneral;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::mpsc;

    /// A fake streamer that answers `getStatus` and counts the polls.
    fn attach_status_responder(link: &Arc<StreamerLink>) -> Arc<AtomicU32> {
        let polls = Arc::new(AtomicU32::new(0));
        let (tx, mut rx) = mpsc::channel::<Arc<String>>(16);
        link.attach(tx);
        let link = link.clone();
        let counter = polls.clone();
        let _task = tokio::spawn(async move {
            while let Some(json) = rx.recv().await {
                let command = CommandMessage::from_json(&json).unwrap();
                if matches!(command, CommandMessage::GetStatus { .. }) {
                    let _ = counter.fetch_add(1, Ordering::Relaxed);
                    let _ = link.complete(
                        command.request_id().as_str(),
                        CommandReply::Status(StatusSnapshot {
                            general: Some(StatusGeneral {
                                is_live: Some(true),
                                ..Default::default()
                            }),
                            ..StatusSnapshot::default()
                        }),
                    );
                }
            }
        });
        polls
    }

    fn make_poller(
        link: Arc<StreamerLink>,
        companions: Arc<CompanionManager>,
    ) -> (StatusPoller, PollerHandle) {
        StatusPoller::new(
            link,
            companions,
            Arc::new(ControlStateCache::new()),
            Duration::from_secs(1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_poller_never_polls() {
        let link = Arc::new(StreamerLink::new(Duration::from_secs(10)));
        let polls = attach_status_responder(&link);
        let companions = Arc::new(CompanionManager::new(4, 3));
        let (poller, _handle) = make_poller(link, companions);

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(poller.run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(polls.load(Ordering::Relaxed), 0);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn active_poller_fetches_and_broadcasts() {
        let link = Arc::new(StreamerLink::new(Duration::from_secs(10)));
        let polls = attach_status_responder(&link);
        let companions = Arc::new(CompanionManager::new(4, 3));
        let (tx, mut companion_rx) = mpsc::channel(32);
        companions
            .register(Arc::new(CompanionConnection::new(ConnectionId::new(), tx)))
            .unwrap();
        let (poller, handle) = make_poller(link, companions);

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(poller.run(shutdown.clone()));
        handle.set_active(true);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(polls.load(Ordering::Relaxed) >= 2);
        assert!(handle.latest().is_some());

        let json = companion_rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "summary");
        assert_eq!(parsed["payload"]["summary"]["isLive"], true);

        shutdown.cancel();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn deactivation_suspends_within_one_cycle() {
        let link = Arc::new(StreamerLink::new(Duration::from_secs(10)));
        let polls = attach_status_responder(&link);
        let companions = Arc::new(CompanionManager::new(4, 3));
        let (poller, handle) = make_poller(link, companions);

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(poller.run(shutdown.clone()));

        handle.set_active(true);
        tokio::time::sleep(Duration::from_secs(3)).await;
        handle.set_active(false);
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let settled = polls.load(Ordering::Relaxed);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(polls.load(Ordering::Relaxed), settled);

        shutdown.cancel();
        task.await.unwrap();
    }
}
