//! WebSocket upgrade handler.

use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use murmur_realtime::connection::authenticator::{HandshakeState, RejectReason};
use murmur_realtime::connection::heartbeat::{HeartbeatConfig, run_heartbeat};
use murmur_realtime::message::types::InboundMessage;

use crate::state::AppState;

/// GET /ws
///
/// Credentials go in the upgrade's `Authorization` header, or, for clients
/// that cannot set headers, in a `connect` frame sent first.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let handshake = match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) => state.realtime.authenticator.authenticate(Some(value)),
        None => HandshakeState::Pending,
    };

    ws.on_upgrade(move |socket| handle_socket(state, handshake, socket))
}

/// Drives one established connection until either side closes it.
async fn handle_socket(state: AppState, handshake: HandshakeState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let (handshake, first_frame) = if handshake.is_pending() {
        let timeout = Duration::from_secs(state.config.realtime.handshake_timeout_seconds);
        match first_frame_handshake(&state, &mut ws_rx, timeout).await {
            Some(resolved) => resolved,
            None => {
                debug!("Client left before completing the handshake");
                return;
            }
        }
    } else {
        (handshake, None)
    };

    let connections = state.realtime.connections.clone();
    let (guard, mut outbound_rx) = connections.register(handshake).await;
    let handle = guard.handle().clone();

    let heartbeat = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig::from(&state.config.realtime),
    ));

    if let Some(text) = first_frame {
        connections.handle_inbound(&handle, &text).await;
    }

    loop {
        tokio::select! {
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    connections.handle_inbound(&handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %handle.id, error = %e, "WebSocket error");
                    break;
                }
            },
            outbound = outbound_rx.recv() => match outbound {
                Some(payload) => {
                    if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                None => break,
            },
            _ = handle.closed() => break,
        }
    }

    heartbeat.abort();
    let _ = ws_tx.send(Message::Close(None)).await;
    info!(conn_id = %handle.id, user_id = ?handle.user_id(), "WebSocket connection closed");
    drop(guard);
}

/// Resolve a handshake from the first text frame.
///
/// A `connect` frame supplies credentials; any other frame (or silence
/// until the timeout) leaves the connection anonymous, and that frame is
/// handed back to be processed normally. `None` means the client went away.
async fn first_frame_handshake(
    state: &AppState,
    ws_rx: &mut SplitStream<WebSocket>,
    timeout: Duration,
) -> Option<(HandshakeState, Option<String>)> {
    let read_first_text = async {
        while let Some(frame) = ws_rx.next().await {
            match frame {
                Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => {}
            }
        }
        None
    };

    match tokio::time::timeout(timeout, read_first_text).await {
        Ok(Some(text)) => match serde_json::from_str::<InboundMessage>(&text) {
            Ok(InboundMessage::Connect { authorization }) => Some((
                state
                    .realtime
                    .authenticator
                    .authenticate(authorization.as_deref()),
                None,
            )),
            _ => Some((
                HandshakeState::Rejected(RejectReason::MissingCredentials),
                Some(text),
            )),
        },
        Ok(None) => None,
        Err(_) => {
            debug!("Handshake timed out; continuing anonymously");
            Some((HandshakeState::Rejected(RejectReason::MissingCredentials), None))
        }
    }
}
