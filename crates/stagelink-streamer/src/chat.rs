//! Chat relay with bounded backlog.
//!
//! Ids are assigned here, monotonically per process, so the assistant can
//! dedupe the overlap between live delivery and the backlog replayed
//! after a reconnect.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};

use parking_lot::Mutex;
use stagelink_protocol::{ChatMessage, ChatMessagesPayload};

/// Assigns chat ids and keeps the replayable backlog.
pub struct ChatRelay {
    next_id: AtomicI64,
    backlog: Mutex<VecDeque<ChatMessage>>,
    limit: usize,
}

impl ChatRelay {
    /// Create a relay keeping at most `limit` messages for replay.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            next_id: AtomicI64::new(1),
            backlog: Mutex::new(VecDeque::with_capacity(limit)),
            limit,
        }
    }

    /// Stamp a platform message with the next id and record it in the
    /// backlog. Returns the stamped message for live delivery.
    pub fn record(&self, mut message: ChatMessage) -> ChatMessage {
        message.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut backlog = self.backlog.lock();
        if backlog.len() == self.limit {
            let _ = backlog.pop_front();
        }
        backlog.push_back(message.clone());
        message
    }

    /// Wrap one freshly recorded message as a live payload.
    #[must_use]
    pub fn live(message: ChatMessage) -> ChatMessagesPayload {
        ChatMessagesPayload {
            history: false,
            messages: vec![message],
        }
    }

    /// The full backlog as a history payload, oldest first.
    #[must_use]
    pub fn history(&self) -> ChatMessagesPayload {
        ChatMessagesPayload {
            history: true,
            messages: self.backlog.lock().iter().cloned().collect(),
        }
    }

    /// Number of messages currently held for replay.
    #[must_use]
    pub fn backlog_len(&self) -> usize {
        self.backlog.lock().len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_protocol::ChatSegment;
    use stagelink_protocol::chat::timestamp_now;

    fn platform_message(user: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: 0,
            user: user.into(),
            user_color: None,
            badges: vec![],
            segments: vec![ChatSegment::text(text)],
            timestamp: timestamp_now(),
            is_action: false,
            is_subscriber: false,
            is_moderator: false,
            highlight: None,
        }
    }

    #[test]
    fn ids_are_monotonic() {
        let relay = ChatRelay::new(10);
        let a = relay.record(platform_message("a", "one"));
        let b = relay.record(platform_message("b", "two"));
        let c = relay.record(platform_message("c", "three"));
        assert!(a.id < b.id);
        assert!(b.id < c.id);
    }

    #[test]
    fn backlog_evicts_oldest_at_limit() {
        let relay = ChatRelay::new(2);
        relay.record(platform_message("a", "1"));
        relay.record(platform_message("b", "2"));
        relay.record(platform_message("c", "3"));
        let history = relay.history();
        assert_eq!(history.messages.len(), 2);
        assert_eq!(history.messages[0].user, "b");
        assert_eq!(history.messages[1].user, "c");
    }

    #[test]
    fn history_payload_is_flagged() {
        let relay = ChatRelay::new(5);
        relay.record(platform_message("a", "hi"));
        assert!(relay.history().history);
        assert_eq!(relay.backlog_len(), 1);
    }

    #[test]
    fn live_payload_is_not_flagged() {
        let relay = ChatRelay::new(5);
        let msg = relay.record(platform_message("a", "hi"));
        let live = ChatRelay::live(msg);
        assert!(!live.history);
        assert_eq!(live.messages.len(), 1);
    }

    #[test]
    fn history_preserves_order() {
        let relay = ChatRelay::new(10);
        for i in 0..5 {
            relay.record(platform_message(&format!("u{i}"), "x"));
        }
        let ids: Vec<i64> = relay.history().messages.iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
