//! Preview subscription tracking.
//!
//! Frame capture costs battery, so the camera pipeline only produces
//! preview frames while at least one connection holds a subscription.
//! This tracks the subscriber set and reports edge transitions; the
//! connection loop flips the delegate on `BecameActive` / `BecameIdle`.

use std::collections::HashSet;

use parking_lot::Mutex;
use stagelink_core::ConnectionId;

/// Result of a subscription change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewTransition {
    /// The subscriber set went from empty to non-empty.
    BecameActive,
    /// The subscriber set went from non-empty to empty.
    BecameIdle,
    /// The set membership did not cross an edge.
    Unchanged,
}

/// Tracks which connections are subscribed to preview frames.
#[derive(Default)]
pub struct PreviewSessions {
    subscribers: Mutex<HashSet<ConnectionId>>,
}

impl PreviewSessions {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection. Subscribing twice is idempotent.
    pub fn subscribe(&self, id: &ConnectionId) -> PreviewTransition {
        let mut subs = self.subscribers.lock();
        let was_empty = subs.is_empty();
        let _ = subs.insert(id.clone());
        if was_empty {
            PreviewTransition::BecameActive
        } else {
            PreviewTransition::Unchanged
        }
    }

    /// Unsubscribe a connection. Unsubscribing a connection that never
    /// subscribed changes nothing.
    pub fn unsubscribe(&self, id: &ConnectionId) -> PreviewTransition {
        let mut subs = self.subscribers.lock();
        if subs.remove(id) && subs.is_empty() {
            PreviewTransition::BecameIdle
        } else {
            PreviewTransition::Unchanged
        }
    }

    /// Drop every subscription (connection teardown).
    pub fn clear(&self) -> PreviewTransition {
        let mut subs = self.subscribers.lock();
        if subs.is_empty() {
            PreviewTransition::Unchanged
        } else {
            subs.clear();
            PreviewTransition::BecameIdle
        }
    }

    /// Whether any subscriber is present.
    #[must_use]
    pub fn active(&self) -> bool {
        !self.subscribers.lock().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_subscriber_activates() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        assert_eq!(sessions.subscribe(&a), PreviewTransition::BecameActive);
        assert!(sessions.active());
    }

    #[test]
    fn second_subscriber_is_unchanged() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _ = sessions.subscribe(&a);
        assert_eq!(sessions.subscribe(&b), PreviewTransition::Unchanged);
    }

    #[test]
    fn duplicate_subscribe_is_idempotent() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        let _ = sessions.subscribe(&a);
        assert_eq!(sessions.subscribe(&a), PreviewTransition::Unchanged);
        assert_eq!(sessions.unsubscribe(&a), PreviewTransition::BecameIdle);
        assert!(!sessions.active());
    }

    #[test]
    fn last_unsubscribe_idles() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _ = sessions.subscribe(&a);
        let _ = sessions.subscribe(&b);
        assert_eq!(sessions.unsubscribe(&a), PreviewTransition::Unchanged);
        assert_eq!(sessions.unsubscribe(&b), PreviewTransition::BecameIdle);
    }

    #[test]
    fn unsubscribe_of_non_member_is_a_noop() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        let stranger = ConnectionId::new();
        let _ = sessions.subscribe(&a);
        assert_eq!(
            sessions.unsubscribe(&stranger),
            PreviewTransition::Unchanged
        );
        assert!(sessions.active());
    }

    #[test]
    fn unsubscribe_on_empty_set_is_a_noop() {
        let sessions = PreviewSessions::new();
        let a = ConnectionId::new();
        assert_eq!(sessions.unsubscribe(&a), PreviewTransition::Unchanged);
        assert!(!sessions.active());
    }

    #[test]
    fn clear_idles_only_when_occupied() {
        let sessions = PreviewSessions::new();
        assert_eq!(sessions.clear(), PreviewTransition::Unchanged);
        let a = ConnectionId::new();
        let _ = sessions.subscribe(&a);
        assert_eq!(sessions.clear(), PreviewTransition::BecameIdle);
        assert!(!sessions.active());
    }
}
