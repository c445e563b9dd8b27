//! WebSocket handlers for the streamer and companion sockets.
//!
//! The streamer socket is hello-gated: the first envelope must be a
//! `hello` whose proof verifies against the shared password, otherwise
//! the socket closes with reason "unauthorized". After that, the reader
//! routes every event to its consumer and the writer drains the link's
//! outbound queue.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use metrics::counter;
use stagelink_core::ConnectionId;
use stagelink_protocol::{Authentication, ChatMessagesPayload, EventMessage};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::companion::{CompanionConnection, CompanionMessage, CompanionSummary};
use crate::heartbeat::{HeartbeatResult, run_heartbeat};
use crate::pending::CommandReply;
use crate::server::AppState;

/// How long the streamer gets to present its hello.
const HELLO_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-connection outbound queue depths.
const STREAMER_QUEUE: usize = 256;
const COMPANION_QUEUE: usize = 64;

// ── Streamer socket ─────────────────────────────────────────────────

/// GET /ws — streamer upgrade.
pub async fn streamer_ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_streamer_socket(state, socket))
}

async fn handle_streamer_socket(state: AppState, mut socket: WebSocket) {
    let authentication =
        match tokio::time::timeout(HELLO_TIMEOUT, wait_for_hello(&mut socket)).await {
            Ok(Some(authentication)) => authentication,
            Ok(None) => {
                warn!("streamer closed or spoke before hello");
                return;
            }
            Err(_elapsed) => {
                warn!("streamer never sent hello");
                return;
            }
        };

    if !authentication.verify(&state.settings.password) {
        counter!("streamer_auth_failures_total").increment(1);
        warn!("rejecting streamer with bad proof");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: Utf8Bytes::from_static("unauthorized"),
            })))
            .await;
        return;
    }

    let (tx, mut outbound) = mpsc::channel::<Arc<String>>(STREAMER_QUEUE);
    state.link.attach(tx.clone());
    counter!("streamer_connections_total").increment(1);
    info!("streamer authenticated");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(json) = outbound.recv().await {
            if sink
                .send(Message::Text(Utf8Bytes::from(json.as_str())))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Text(raw)) => match EventMessage::from_json(raw.as_str()) {
                Ok(event) => route_event(&state, event),
                Err(err) => warn!(%err, "discarding unparseable event"),
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    state.link.detach(&tx);
    writer.abort();
    warn!("streamer disconnected");
}

/// Read until the hello arrives. Anything else first is a protocol
/// violation and ends the handshake.
async fn wait_for_hello(socket: &mut WebSocket) -> Option<Authentication> {
    while let Some(incoming) = socket.recv().await {
        match incoming {
            Ok(Message::Text(raw)) => {
                return match EventMessage::from_json(raw.as_str()) {
                    Ok(EventMessage::Hello { authentication }) => Some(authentication),
                    Ok(other) => {
                        warn!(event = other.name(), "expected hello first");
                        None
                    }
                    Err(err) => {
                        warn!(%err, "unparseable hello");
                        None
                    }
                };
            }
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

/// Route one streamer event to its consumer.
pub(crate) fn route_event(state: &AppState, event: EventMessage) {
    counter!("streamer_events_total", "event" => event.name()).increment(1);
    match event {
        EventMessage::Hello { .. } => warn!("unexpected hello after authentication"),
        EventMessage::Ack { request_id } => {
            if !state.link.complete(request_id.as_str(), CommandReply::Ack) {
                debug!(request_id = request_id.as_str(), "ack for unknown request");
            }
        }
        EventMessage::Status {
            request_id,
            snapshot,
        } => {
            let _ = state
                .link
                .complete(request_id.as_str(), CommandReply::Status(snapshot));
        }
        EventMessage::Settings {
            request_id,
            snapshot,
        } => {
            state.settings_cache.replace(snapshot.clone());
            let _ = state
                .link
                .complete(request_id.as_str(), CommandReply::Settings(snapshot));
        }
        EventMessage::StateChanged { state: diff } => {
            state.control_state.apply(&diff);
            state
                .companions
                .broadcast(&CompanionMessage::StateChanged { state: diff });
        }
        EventMessage::ChatMessages(payload) => {
            let fresh = state.chat.ingest(payload);
            if !fresh.is_empty() {
                state
                    .companions
                    .broadcast(&CompanionMessage::ChatMessages(ChatMessagesPayload {
                        history: false,
                        messages: fresh,
                    }));
            }
        }
        EventMessage::Preview { frame } => state.companions.on_preview_frame(&frame),
        EventMessage::Log { text } => info!(device_log = %text, "streamer log"),
        EventMessage::TwitchEventSubNotification { message } => {
            debug!(?message, "platform notification");
        }
    }
}

// ── Companion socket ────────────────────────────────────────────────

/// GET /companion — companion upgrade.
pub async fn companion_ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_companion_socket(state, socket))
}

async fn handle_companion_socket(state: AppState, mut socket: WebSocket) {
    let id = ConnectionId::new();
    let (tx, mut outbound) = mpsc::channel::<Arc<String>>(COMPANION_QUEUE);
    let connection = Arc::new(CompanionConnection::new(id.clone(), tx));

    if let Err(err) = state.companions.register(connection.clone()) {
        warn!(%err, "rejecting companion");
        let _ = socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::AGAIN,
                reason: Utf8Bytes::from_static("companion limit reached"),
            })))
            .await;
        return;
    }
    state.poller.set_active(true);
    info!(connection_id = id.as_str(), "companion connected");

    catch_up(&state, &connection);

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(json) = outbound.recv().await {
            if sink
                .send(Message::Text(Utf8Bytes::from(json.as_str())))
                .await
                .is_err()
            {
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    let mut heartbeat = tokio::spawn(run_heartbeat(
        connection.clone(),
        Duration::from_secs(state.settings.heartbeat_interval_secs),
        Duration::from_secs(state.settings.heartbeat_timeout_secs),
        cancel.clone(),
    ));

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                // Any traffic counts as liveness; axum answers pings itself.
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => connection.mark_alive(),
            },
            result = &mut heartbeat => {
                if matches!(result, Ok(HeartbeatResult::TimedOut)) {
                    warn!(connection_id = id.as_str(), "companion heartbeat timed out");
                }
                break;
            }
        }
    }

    cancel.cancel();
    writer.abort();
    state.companions.unregister(&id);
    if state.companions.count() == 0 {
        state.poller.set_active(false);
    }
    info!(connection_id = id.as_str(), dropped = connection.drop_count(), "companion disconnected");
}

/// Bring a fresh companion up to date with everything we mirror.
fn catch_up(state: &AppState, connection: &CompanionConnection) {
    let snapshot = state.control_state.snapshot();
    if !snapshot.is_empty() {
        send_to(connection, &CompanionMessage::StateChanged { state: snapshot });
    }
    let log = state.chat.log();
    if !log.messages.is_empty() {
        send_to(connection, &CompanionMessage::ChatMessages(log));
    }
    if let Some(status) = state.poller.latest() {
        let summary = CompanionSummary::derive(&status, &state.control_state.snapshot());
        send_to(connection, &CompanionMessage::Summary { summary });
    }
}

fn send_to(connection: &CompanionConnection, message: &CompanionMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            let _ = connection.send(Arc::new(json));
        }
        Err(err) => debug!(%err, "failed to serialize companion message"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
