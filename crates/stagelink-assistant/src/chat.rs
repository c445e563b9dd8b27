//! Chat de-duplication and the assistant-side log.
//!
//! Live delivery and the backlog replayed after a reconnect overlap. The
//! tracker keeps the highest chat id it has accepted and drops anything
//! at or below it, so one-shot effects (notification sounds, highlight
//! banners) fire exactly once per message no matter how often the link
//! flaps. Accepted messages also land in a bounded log that late-joining
//! companions are caught up from.

use std::collections::VecDeque;

use parking_lot::Mutex;
use stagelink_protocol::{ChatMessage, ChatMessagesPayload};

struct TrackerInner {
    /// Highest accepted id; `None` until the first message ever arrives.
    last_seen_id: Option<i64>,
    log: VecDeque<ChatMessage>,
}

/// De-duplicates incoming chat payloads against `lastSeenId`.
pub struct ChatTracker {
    inner: Mutex<TrackerInner>,
    limit: usize,
}

impl ChatTracker {
    /// Create a tracker keeping at most `limit` messages in the log.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                last_seen_id: None,
                log: VecDeque::with_capacity(limit),
            }),
            limit,
        }
    }

    /// Ingest one payload (live or history). Returns the messages that
    /// were not seen before, in payload order; the caller fires one-shot
    /// effects for exactly these.
    pub fn ingest(&self, payload: ChatMessagesPayload) -> Vec<ChatMessage> {
        let mut inner = self.inner.lock();
        let mut fresh = Vec::new();
        for message in payload.messages {
            if inner.last_seen_id.is_some_and(|seen| message.id <= seen) {
                continue;
            }
            inner.last_seen_id = Some(
                inner
                    .last_seen_id
                    .map_or(message.id, |seen| seen.max(message.id)),
            );
            if inner.log.len() == self.limit {
                let _ = inner.log.pop_front();
            }
            inner.log.push_back(message.clone());
            fresh.push(message);
        }
        fresh
    }

    /// Highest accepted id, or `None` when nothing has ever arrived.
    #[must_use]
    pub fn last_seen_id(&self) -> Option<i64> {
        self.inner.lock().last_seen_id
    }

    /// The accepted log, oldest first, as a history payload for
    /// companion catch-up.
    #[must_use]
    pub fn log(&self) -> ChatMessagesPayload {
        ChatMessagesPayload {
            history: true,
            messages: self.inner.lock().log.iter().cloned().collect(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_protocol::ChatSegment;

    fn message(id: i64) -> ChatMessage {
        ChatMessage {
            id,
            user: format!("user{id}"),
            user_color: None,
            badges: vec![],
            segments: vec![ChatSegment::text("hi")],
            timestamp: "2026-08-27T10:00:00.000Z".into(),
            is_action: false,
            is_subscriber: false,
            is_moderator: false,
            highlight: None,
        }
    }

    fn payload(history: bool, ids: &[i64]) -> ChatMessagesPayload {
        ChatMessagesPayload {
            history,
            messages: ids.iter().copied().map(message).collect(),
        }
    }

    #[test]
    fn pristine_tracker_accepts_everything() {
        let tracker = ChatTracker::new(10);
        assert!(tracker.last_seen_id().is_none());
        let fresh = tracker.ingest(payload(true, &[5, 6]));
        assert_eq!(fresh.len(), 2);
        assert_eq!(tracker.last_seen_id(), Some(6));
    }

    #[test]
    fn replayed_overlap_fires_effects_exactly_once() {
        let tracker = ChatTracker::new(10);

        let live: Vec<i64> = tracker
            .ingest(payload(false, &[1, 2, 3]))
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(live, vec![1, 2, 3]);

        // Link flap: the streamer replays its backlog, which overlaps.
        let replayed: Vec<i64> = tracker
            .ingest(payload(true, &[2, 3, 4]))
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(replayed, vec![4], "2 and 3 were already seen");
        assert_eq!(tracker.last_seen_id(), Some(4));
    }

    #[test]
    fn fully_seen_replay_is_silent() {
        let tracker = ChatTracker::new(10);
        let _ = tracker.ingest(payload(false, &[1, 2, 3]));
        let fresh = tracker.ingest(payload(true, &[1, 2, 3]));
        assert!(fresh.is_empty());
        assert_eq!(tracker.last_seen_id(), Some(3));
    }

    #[test]
    fn log_keeps_accepted_messages_in_order() {
        let tracker = ChatTracker::new(10);
        let _ = tracker.ingest(payload(false, &[1, 2]));
        let _ = tracker.ingest(payload(true, &[2, 3]));
        let ids: Vec<i64> = tracker.log().messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(tracker.log().history);
    }

    #[test]
    fn log_is_bounded() {
        let tracker = ChatTracker::new(2);
        let _ = tracker.ingest(payload(false, &[1, 2, 3]));
        let ids: Vec<i64> = tracker.log().messages.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
