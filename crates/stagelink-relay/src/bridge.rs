//! The bridge itself.
//!
//! Dials the public rendezvous endpoint (bridge id in the URL path) and
//! the local assistant, then pipes frames both ways without looking at
//! them. The bridge carries no protocol knowledge at all; authentication
//! still happens end to end between streamer and assistant. Either leg
//! failing tears down both, and the bridge never retries; whoever runs
//! it decides whether to start another.

use futures::{SinkExt, StreamExt};
use metrics::counter;
use stagelink_settings::RelaySettings;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{RelayError, Result};

/// Join the rendezvous base URL and the bridge id.
#[must_use]
pub fn bridge_url(rendezvous_url: &str, bridge_id: &str) -> String {
    format!("{}/{}", rendezvous_url.trim_end_matches('/'), bridge_id)
}

/// What to do with one frame off a leg.
#[derive(Debug, PartialEq)]
enum Frame {
    /// Payload, forward to the other leg untouched.
    Forward(Message),
    /// Control frame, stays local (tungstenite answers pings itself).
    Skip,
    /// The peer is closing.
    Closing,
}

fn classify(message: Message) -> Frame {
    match message {
        Message::Text(_) | Message::Binary(_) => Frame::Forward(message),
        Message::Close(_) => Frame::Closing,
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => Frame::Skip,
    }
}

/// Run one bridge lifetime. Returns when either leg closes, a transport
/// error occurs, or `shutdown` fires.
pub async fn run_bridge(settings: RelaySettings, shutdown: CancellationToken) -> Result<()> {
    let rendezvous_url = bridge_url(&settings.rendezvous_url, &settings.bridge_id);

    let (rendezvous, _response) = connect_async(&rendezvous_url).await?;
    info!(url = %rendezvous_url, "rendezvous leg up");
    let (assistant, _response) = connect_async(&settings.assistant_url).await?;
    info!(url = %settings.assistant_url, "assistant leg up");

    let (mut rendezvous_sink, mut rendezvous_source) = rendezvous.split();
    let (mut assistant_sink, mut assistant_source) = assistant.split();

    let result = loop {
        tokio::select! {
            () = shutdown.cancelled() => break Ok(()),
            inbound = rendezvous_source.next() => {
                match inbound {
                    Some(Ok(message)) => match classify(message) {
                        Frame::Forward(frame) => {
                            counter!("relay_frames_total", "direction" => "inbound").increment(1);
                            if let Err(err) = assistant_sink.send(frame).await {
                                break Err(err.into());
                            }
                        }
                        Frame::Skip => {}
                        Frame::Closing => break Err(RelayError::LegClosed { side: "rendezvous" }),
                    },
                    Some(Err(err)) => break Err(err.into()),
                    None => break Err(RelayError::LegClosed { side: "rendezvous" }),
                }
            }
            outbound = assistant_source.next() => {
                match outbound {
                    Some(Ok(message)) => match classify(message) {
                        Frame::Forward(frame) => {
                            counter!("relay_frames_total", "direction" => "outbound").increment(1);
                            if let Err(err) = rendezvous_sink.send(frame).await {
                                break Err(err.into());
                            }
                        }
                        Frame::Skip => {}
                        Frame::Closing => break Err(RelayError::LegClosed { side: "assistant" }),
                    },
                    Some(Err(err)) => break Err(err.into()),
                    None => break Err(RelayError::LegClosed { side: "assistant" }),
                }
            }
        }
    };

    // Tear down both legs whichever way we got here.
    let _ = rendezvous_sink.send(Message::Close(None)).await;
    let _ = assistant_sink.send(Message::Close(None)).await;
    debug!("bridge torn down");
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
