//! # stagelink-assistant
//!
//! The assistant role: an Axum server the streamer dials into, a typed
//! command surface with request correlation, mirrored state caches, a
//! fixed-cadence status poller, and fan-out to low-bandwidth companion
//! clients.

#![deny(unsafe_code)]

pub mod cache;
pub mod chat;
pub mod companion;
pub mod errors;
pub mod health;
pub mod heartbeat;
pub mod link;
pub mod pending;
pub mod poller;
pub mod server;
pub mod shutdown;
pub mod ws;

pub use cache::{ControlStateCache, SettingsCache};
pub use chat::ChatTracker;
pub use companion::{CompanionManager, CompanionMessage, CompanionSummary};
pub use errors::{AssistantError, Result};
pub use link::StreamerLink;
pub use pending::{CommandReply, PendingRequests};
pub use poller::{PollerHandle, StatusPoller};
pub use server::{AppState, AssistantServer};
pub use shutdown::ShutdownCoordinator;
