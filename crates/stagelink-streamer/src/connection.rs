//! Assistant link.
//!
//! The streamer is the dialing side: it connects out to the assistant,
//! authenticates with the first envelope, resyncs state, then serves
//! commands and forwards device events until the link drops. A dropped
//! link is retried forever at a fixed cadence; in-flight commands are
//! simply lost and the assistant re-issues what it still cares about.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use metrics::counter;
use stagelink_core::ConnectionId;
use stagelink_protocol::{Authentication, ChatMessage, CommandMessage, EventMessage};
use stagelink_settings::StreamerSettings;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::chat::ChatRelay;
use crate::delegate::StreamerDelegate;
use crate::dispatch::CommandDispatcher;
use crate::errors::{Result, StreamerError};
use crate::preview::{PreviewSessions, PreviewTransition};
use crate::state::StateStore;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Something the device produced that belongs on the wire.
#[derive(Debug)]
pub enum IngestEvent {
    /// A platform chat message (id is assigned by the relay).
    Chat(ChatMessage),
    /// A device log line.
    Log(String),
    /// A raw platform notification to pass through untouched.
    TwitchEvent(serde_json::Value),
    /// One preview frame, JPEG bytes base64 encoded.
    PreviewFrame(String),
}

/// Latest-wins preview forwarding, paced to the configured frame rate.
///
/// Frames captured while the sink is busy or the pacing window has not
/// elapsed overwrite the pending slot; only the newest frame ever goes
/// out, and never faster than the frame rate.
struct FrameGate {
    interval: Duration,
    slot: Option<String>,
    next_due: tokio::time::Instant,
}

impl FrameGate {
    fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            slot: None,
            next_due: tokio::time::Instant::now(),
        }
    }

    /// Replace the pending frame. An earlier frame that never went out
    /// is superseded.
    fn offer(&mut self, frame: String) {
        self.slot = Some(frame);
    }

    fn has_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// When the pending frame may go out.
    fn due_at(&self) -> tokio::time::Instant {
        self.next_due
    }

    /// Take the pending frame and open the next pacing window.
    fn take(&mut self, now: tokio::time::Instant) -> Option<String> {
        let frame = self.slot.take()?;
        self.next_due = now + self.interval;
        Some(frame)
    }
}

/// Run the streamer role until `shutdown` fires.
///
/// Reconnects at the configured fixed delay whenever the link drops.
pub async fn run_streamer(
    settings: StreamerSettings,
    delegate: Arc<dyn StreamerDelegate>,
    mut ingest: mpsc::Receiver<IngestEvent>,
    shutdown: CancellationToken,
) -> Result<()> {
    let state = Arc::new(StateStore::new());
    let preview = Arc::new(PreviewSessions::new());
    let chat = Arc::new(ChatRelay::new(settings.chat_backlog_limit));
    let dispatcher = CommandDispatcher::new(
        delegate.clone(),
        state.clone(),
        preview.clone(),
        Duration::from_millis(settings.command_timeout_ms),
    );

    let mut attempt: u32 = 0;
    loop {
        if shutdown.is_cancelled() {
            return Ok(());
        }

        let outcome = connect_once(
            &settings,
            &dispatcher,
            &state,
            &preview,
            &chat,
            &mut ingest,
            &shutdown,
        )
        .await;

        // The camera must not stay hot once the link is gone, whether it
        // died or we are shutting down cleanly.
        if preview.clear() == PreviewTransition::BecameIdle {
            if let Err(err) = delegate.set_preview_active(false).await {
                warn!(%err, "failed to stop preview capture");
            }
        }

        match outcome {
            Ok(()) => return Ok(()),
            Err(err) => warn!(attempt, %err, "assistant link lost"),
        }

        counter!("streamer_reconnects_total").increment(1);
        tokio::select! {
            () = shutdown.cancelled() => return Ok(()),
            () = tokio::time::sleep(settings.reconnect.delay(attempt)) => {}
        }
        attempt += 1;
    }
}

/// One connection lifetime. Returns `Ok` only on shutdown.
async fn connect_once(
    settings: &StreamerSettings,
    dispatcher: &CommandDispatcher,
    state: &StateStore,
    preview: &PreviewSessions,
    chat: &ChatRelay,
    ingest: &mut mpsc::Receiver<IngestEvent>,
    shutdown: &CancellationToken,
) -> Result<()> {
    let (stream, _response) = tokio::time::timeout(
        settings.reconnect.handshake_timeout(),
        connect_async(&settings.assistant_url),
    )
    .await
    .map_err(|_elapsed| StreamerError::HandshakeTimeout)??;
    let (mut sink, source) = stream.split();

    let conn = ConnectionId::new();
    info!(connection_id = conn.as_str(), url = %settings.assistant_url, "connected to assistant");

    // Authenticate, then bring the assistant fully up to date.
    send_event(
        &mut sink,
        &EventMessage::Hello {
            authentication: Authentication::generate(&settings.password),
        },
    )
    .await?;
    send_event(
        &mut sink,
        &EventMessage::StateChanged {
            state: state.snapshot(),
        },
    )
    .await?;
    let history = chat.history();
    if !history.messages.is_empty() {
        send_event(&mut sink, &EventMessage::ChatMessages(history)).await?;
    }

    let gate = FrameGate::new(settings.preview_fps);
    serve(
        &conn, dispatcher, preview, chat, gate, sink, source, ingest, shutdown,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn serve(
    conn: &ConnectionId,
    dispatcher: &CommandDispatcher,
    preview: &PreviewSessions,
    chat: &ChatRelay,
    mut gate: FrameGate,
    mut sink: WsSink,
    mut source: WsSource,
    ingest: &mut mpsc::Receiver<IngestEvent>,
    shutdown: &CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(());
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Text(raw))) => match CommandMessage::from_json(raw.as_str()) {
                        Ok(command) => {
                            for event in dispatcher.dispatch(conn, command).await {
                                send_event(&mut sink, &event).await?;
                            }
                        }
                        Err(err) => warn!(%err, "discarding unparseable command"),
                    },
                    Some(Ok(Message::Ping(payload))) => {
                        sink.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => return Err(StreamerError::ConnectionClosed),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                }
            }
            produced = ingest.recv() => {
                // A closed ingest channel means the device side is gone.
                let Some(event) = produced else { return Ok(()); };
                match event {
                    // Frames are dropped while nobody is subscribed and
                    // otherwise parked in the gate.
                    IngestEvent::PreviewFrame(frame) => {
                        if preview.active() {
                            gate.offer(frame);
                        }
                    }
                    other => {
                        if let Some(outbound) = ingest_to_event(other, chat) {
                            send_event(&mut sink, &outbound).await?;
                        }
                    }
                }
            }
            () = tokio::time::sleep_until(gate.due_at()), if gate.has_pending() => {
                if let Some(frame) = gate.take(tokio::time::Instant::now()) {
                    if preview.active() {
                        send_event(&mut sink, &EventMessage::Preview { frame }).await?;
                    }
                }
            }
        }
    }
}

/// Map a device event to its wire form. Preview frames never come this
/// way; they go through the [`FrameGate`].
fn ingest_to_event(event: IngestEvent, chat: &ChatRelay) -> Option<EventMessage> {
    match event {
        IngestEvent::Chat(message) => Some(EventMessage::ChatMessages(ChatRelay::live(
            chat.record(message),
        ))),
        IngestEvent::Log(text) => Some(EventMessage::Log { text }),
        IngestEvent::TwitchEvent(message) => {
            Some(EventMessage::TwitchEventSubNotification { message })
        }
        IngestEvent::PreviewFrame(_) => None,
    }
}

async fn send_event(sink: &mut WsSink, event: &EventMessage) -> Result<()> {
    let json = event.to_json()?;
    sink.send(Message::Text(json.into())).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use stagelink_protocol::ChatSegment;
    use stagelink_protocol::chat::timestamp_now;

    fn platform_message(user: &str) -> ChatMessage {
        ChatMessage {
            id: 0,
            user: user.into(),
            user_color: None,
            badges: vec![],
            segments: vec![ChatSegment::text("hello")],
            timestamp: timestamp_now(),
            is_action: false,
            is_subscriber: false,
            is_moderator: false,
            highlight: None,
        }
    }

    #[test]
    fn chat_ingest_becomes_a_live_payload() {
        let chat = ChatRelay::new(10);
        let event = ingest_to_event(IngestEvent::Chat(platform_message("alice")), &chat).unwrap();
        let EventMessage::ChatMessages(payload) = event else {
            panic!("expected chatMessages");
        };
        assert!(!payload.history);
        assert_eq!(payload.messages[0].user, "alice");
        assert_eq!(payload.messages[0].id, 1, "relay assigns the id");
        assert_eq!(chat.backlog_len(), 1);
    }

    #[test]
    fn log_and_twitch_events_pass_through() {
        let chat = ChatRelay::new(10);
        assert!(matches!(
            ingest_to_event(IngestEvent::Log("srt up".into()), &chat),
            Some(EventMessage::Log { .. })
        ));
        assert!(matches!(
            ingest_to_event(IngestEvent::TwitchEvent(serde_json::json!({"e": 1})), &chat),
            Some(EventMessage::TwitchEventSubNotification { .. })
        ));
    }

    #[test]
    fn preview_frames_do_not_bypass_the_gate() {
        let chat = ChatRelay::new(10);
        assert!(ingest_to_event(IngestEvent::PreviewFrame("aGk=".into()), &chat).is_none());
    }

    // ── Frame gate ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn stale_pending_frame_is_superseded() {
        let mut gate = FrameGate::new(5);
        gate.offer("f1".into());
        gate.offer("f2".into());

        let now = tokio::time::Instant::now();
        assert_eq!(gate.take(now), Some("f2".into()), "only the newest survives");
        assert!(!gate.has_pending());
        assert_eq!(gate.take(now), None);
    }

    #[tokio::test(start_paused = true)]
    async fn frames_are_paced_to_the_configured_rate() {
        let mut gate = FrameGate::new(5);
        let start = tokio::time::Instant::now();

        gate.offer("f1".into());
        assert!(gate.due_at() <= start, "the first frame may go out at once");
        let _ = gate.take(start);

        gate.offer("f2".into());
        assert_eq!(gate.due_at(), start + Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_fps_is_clamped_to_one() {
        let mut gate = FrameGate::new(0);
        let start = tokio::time::Instant::now();
        gate.offer("f1".into());
        let _ = gate.take(start);
        assert_eq!(gate.due_at(), start + Duration::from_secs(1));
    }
}
