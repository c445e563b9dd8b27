//! # stagelink-core
//!
//! Foundation types and utilities shared by every stagelink crate.
//!
//! - **Branded IDs**: `RequestId`, `ConnectionId`, `BridgeId` as newtypes
//!   for type safety
//! - **Reconnect policy**: [`reconnect::ReconnectConfig`] with the fixed
//!   short-delay transport recovery used by the streamer and companions
//! - **Logging**: [`logging::init_subscriber`] for the `tracing` stack

#![deny(unsafe_code)]

pub mod ids;
pub mod logging;
pub mod reconnect;

pub use ids::{BridgeId, ConnectionId, RequestId};
pub use reconnect::ReconnectConfig;
