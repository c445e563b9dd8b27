//! # stagelink-relay
//!
//! A stateless WebSocket bridge for assistants behind NAT: one leg out to
//! a public rendezvous endpoint, one leg into the local assistant, frames
//! piped both ways without inspection.

#![deny(unsafe_code)]

pub mod bridge;
pub mod errors;

pub use bridge::{bridge_url, run_bridge};
pub use errors::{RelayError, Result};
