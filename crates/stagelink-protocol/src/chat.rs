//! Chat messages and history replay batches.
//!
//! Ids increase strictly within a streamer session; receivers use them to
//! de-duplicate history replays after reconnects. The `history` flag marks
//! a whole batch as replayed backlog rather than live traffic.

use serde::{Deserialize, Serialize};

/// One rendered chat message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Session-monotonic message id.
    pub id: i64,
    /// Sender display name.
    pub user: String,
    /// Sender name color (hex), if the platform provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_color: Option<String>,
    /// Sender badge identifiers.
    pub badges: Vec<String>,
    /// Message body segments in display order.
    pub segments: Vec<ChatSegment>,
    /// RFC 3339 receive timestamp.
    pub timestamp: String,
    /// Whether this is an action (`/me`) message.
    pub is_action: bool,
    /// Whether the sender is a subscriber.
    pub is_subscriber: bool,
    /// Whether the sender is a moderator.
    pub is_moderator: bool,
    /// Platform highlight (raid, redemption, first message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight: Option<ChatHighlight>,
}

/// A body segment: plain text or an image URL (emote).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSegment {
    /// Plain text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Emote image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ChatSegment {
    /// A plain text segment.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            url: None,
        }
    }

    /// An emote segment.
    #[must_use]
    pub fn emote(url: impl Into<String>) -> Self {
        Self {
            text: None,
            url: Some(url.into()),
        }
    }
}

/// Platform-supplied highlight attached to a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHighlight {
    /// Highlight kind (e.g. `redemption`, `firstMessage`).
    pub kind: String,
    /// Display title.
    pub title: String,
}

/// Payload of a `chatMessages` envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagesPayload {
    /// Whether this batch is replayed backlog.
    pub history: bool,
    /// Messages in id order.
    pub messages: Vec<ChatMessage>,
}

/// Current time as an RFC 3339 string with millisecond precision.
#[must_use]
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
