//! # stagelink-streamer
//!
//! The streamer role: dials the assistant over WebSocket, authenticates,
//! executes control commands against the device through
//! [`StreamerDelegate`], and pushes state diffs, chat, logs, and preview
//! frames back up the link.

#![deny(unsafe_code)]

pub mod chat;
pub mod connection;
pub mod delegate;
pub mod dispatch;
pub mod errors;
pub mod preview;
pub mod state;

pub use chat::ChatRelay;
pub use connection::{IngestEvent, run_streamer};
pub use delegate::StreamerDelegate;
pub use dispatch::CommandDispatcher;
pub use errors::{Result, StreamerError};
pub use preview::{PreviewSessions, PreviewTransition};
pub use state::StateStore;
