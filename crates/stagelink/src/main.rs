//! # stagelink
//!
//! One binary, three roles: `streamer` dials out to an assistant and
//! exposes the device over the control plane, `assistant` serves the
//! monitoring endpoint, `relay` bridges an assistant behind NAT to a
//! public rendezvous point. One settings file configures all three; each
//! invocation reads only its role's section.

#![deny(unsafe_code)]

mod sim;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stagelink_assistant::server::AssistantServer;
use stagelink_relay::run_bridge;
use stagelink_settings::StagelinkSettings;
use stagelink_streamer::{IngestEvent, run_streamer};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::sim::SimulatedDevice;

/// Remote control plane for live mobile streaming.
#[derive(Parser, Debug)]
#[command(name = "stagelink", about = "Remote control plane for live streaming")]
struct Cli {
    /// Settings file (defaults to `~/.stagelink/settings.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Shared control-plane password (overrides settings).
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Run the streamer role against a simulated device.
    Streamer {
        /// Assistant WebSocket URL to dial (overrides settings).
        #[arg(long)]
        assistant_url: Option<String>,
    },
    /// Run the assistant server.
    Assistant {
        /// Host to bind (overrides settings).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, 0 for auto-assign (overrides settings).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the relay bridge.
    Relay {
        /// Bridge id on the rendezvous endpoint (overrides settings).
        #[arg(long)]
        bridge_id: Option<String>,
    },
}

fn load_settings(cli: &Cli) -> Result<StagelinkSettings> {
    let mut settings = match &cli.config {
        Some(path) => stagelink_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => stagelink_settings::load_settings().context("Failed to load settings")?,
    };
    if let Some(password) = &cli.password {
        settings.streamer.password.clone_from(password);
        settings.assistant.password.clone_from(password);
    }
    Ok(settings)
}

/// A token that cancels on ctrl-c.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let signal_token = token.clone();
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        }
    }));
    token
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(&cli)?;
    stagelink_core::logging::init_subscriber(&settings.log_level);

    match cli.role {
        Role::Streamer { assistant_url } => {
            if let Some(url) = assistant_url {
                settings.streamer.assistant_url = url;
            }
            tracing::info!(
                url = %settings.streamer.assistant_url,
                "starting streamer (simulated device)"
            );

            // No hardware backend feeds chat or preview frames here; the
            // channel stays open but idle so the loop still drains it.
            let (_ingest_tx, ingest_rx) = mpsc::channel::<IngestEvent>(64);
            let device = Arc::new(SimulatedDevice::new());
            run_streamer(settings.streamer, device, ingest_rx, shutdown_token())
                .await
                .context("streamer loop failed")?;
        }
        Role::Assistant { host, port } => {
            if let Some(host) = host {
                settings.assistant.host = host;
            }
            if let Some(port) = port {
                settings.assistant.port = port;
            }
            let server = AssistantServer::new(settings.assistant);

            let coordinator = server.shutdown().clone();
            drop(tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown signal received");
                    coordinator.shutdown();
                }
            }));

            server.serve().await.context("assistant server failed")?;
        }
        Role::Relay { bridge_id } => {
            if let Some(id) = bridge_id {
                settings.relay.bridge_id = id;
            }
            tracing::info!(
                rendezvous = %settings.relay.rendezvous_url,
                bridge_id = %settings.relay.bridge_id,
                "starting relay bridge"
            );
            run_bridge(settings.relay, shutdown_token())
                .await
                .context("relay bridge failed")?;
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
