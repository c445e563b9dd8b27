//! Companion ping/pong liveness monitoring.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::companion::CompanionConnection;

/// Outcome of the heartbeat loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatResult {
    /// The companion stopped responding within the timeout window.
    TimedOut,
    /// The heartbeat was cancelled externally.
    Cancelled,
}

/// Run heartbeat checks for one companion.
///
/// At each `interval` tick the alive flag is checked and reset. Missing
/// `timeout / interval` consecutive checks (clamped to at least 1) marks
/// the companion dead; pongs routed through
/// [`CompanionConnection::mark_alive`] reset the count.
pub async fn run_heartbeat(
    connection: Arc<CompanionConnection>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> HeartbeatResult {
    let mut ticker = time::interval(interval);
    let mut missed: u32 = 0;
    let interval_secs = interval.as_secs().max(1);
    #[allow(clippy::cast_possible_truncation)]
    let max_missed = (timeout.as_secs() / interval_secs).max(1) as u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if connection.check_alive() {
                    missed = 0;
                } else {
                    missed += 1;
                    if missed >= max_missed {
                        return HeartbeatResult::TimedOut;
                    }
                }
            }
            () = cancel.cancelled() => {
                return HeartbeatResult::Cancelled;
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
    use stagelink_core::ConnectionId;
    use tokio::sync::mpsc;

    fn make_connection() -> Arc<CompanionConnection> {
        let (tx, _rx) = mpsc::channel(8);
        Arc::new(CompanionConnection::new(ConnectionId::new(), tx))
    }

    #[tokio::test]
    async fn cancellation_wins() {
        let conn = make_connection();
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                run_heartbeat(conn, Duration::from_secs(60), Duration::from_secs(180), cancel)
                    .await
            })
        };
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn silent_companion_times_out() {
        let conn = make_connection();
        // First tick consumes the initial alive flag; silence after that.
        let result = run_heartbeat(
            conn,
            Duration::from_secs(30),
            Duration::from_secs(90),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(result, HeartbeatResult::TimedOut);
    }

    #[tokio::test]
    async fn responsive_companion_survives() {
        let conn = make_connection();
        let cancel = CancellationToken::new();
        let handle = {
            let conn = conn.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                run_heartbeat(
                    conn,
                    Duration::from_millis(50),
                    Duration::from_millis(200),
                    cancel,
                )
                .await
            })
        };

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            conn.mark_alive();
        }
        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatResult::Cancelled);
    }
}
