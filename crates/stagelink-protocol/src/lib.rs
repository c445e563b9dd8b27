//! # stagelink-protocol
//!
//! The remote-control wire model shared by the streamer, the assistant,
//! and their tests.
//!
//! Every transport message is a single JSON envelope
//! `{"type": ..., "payload": ...}`:
//!
//! - [`CommandMessage`] — assistant to streamer (commands and pulls)
//! - [`EventMessage`] — streamer to assistant (acks, diffs, snapshots,
//!   chat, preview frames, passthrough)
//!
//! Plus the payload vocabulary:
//!
//! - [`ControlState`] — optional-field diff record with last-writer-wins
//!   merge
//! - [`StatusSnapshot`] — the three optional status groups
//! - [`SettingsSnapshot`] — capability catalog, always replaced whole
//! - [`ChatMessage`] — monotonic-id chat with history replay
//! - [`Authentication`] — salted-hash challenge proof

#![deny(unsafe_code)]

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod envelope;
pub mod errors;
pub mod scene;
pub mod state;
pub mod status;

pub use auth::Authentication;
pub use catalog::SettingsSnapshot;
pub use chat::{ChatMessage, ChatMessagesPayload, ChatSegment};
pub use envelope::{CommandMessage, EventMessage};
pub use errors::{ProtocolError, Result};
pub use scene::{RemoteSceneData, RemoteSceneSettings};
pub use state::ControlState;
pub use status::StatusSnapshot;
