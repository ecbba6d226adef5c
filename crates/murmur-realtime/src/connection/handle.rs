//! Individual WebSocket connection handle.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

use murmur_core::types::{ConnectionId, Principal, RoomId, UserId};

use crate::message::types::OutboundMessage;

/// Result of pushing one frame into a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    /// Queued for the socket writer.
    Delivered,
    /// The queue stayed full for the whole send timeout.
    TimedOut,
    /// The connection is gone.
    Closed,
}

/// A handle to a single WebSocket connection.
///
/// The transport owns the socket; the engine only holds this handle, which
/// carries the queue sender plus the principal bound at handshake time.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Bound identity. `None` for anonymous (rejected) connections.
    pub principal: Option<Principal>,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<String>,
    send_timeout: Duration,
    joined_rooms: Mutex<HashSet<RoomId>>,
    last_pong_ms: AtomicI64,
    alive: AtomicBool,
    close_signal: Notify,
}

impl ConnectionHandle {
    /// Create a new connection handle.
    pub fn new(
        principal: Option<Principal>,
        sender: mpsc::Sender<String>,
        send_timeout: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            principal,
            connected_at: now,
            sender,
            send_timeout,
            joined_rooms: Mutex::new(HashSet::new()),
            last_pong_ms: AtomicI64::new(now.timestamp_millis()),
            alive: AtomicBool::new(true),
            close_signal: Notify::new(),
        }
    }

    /// The bound user, if any.
    pub fn user_id(&self) -> Option<UserId> {
        self.principal.as_ref().map(|p| p.user_id)
    }

    /// Queue a serialized frame, waiting at most the send timeout for space.
    pub async fn send(&self, payload: String) -> SendOutcome {
        if !self.is_alive() {
            return SendOutcome::Closed;
        }
        match tokio::time::timeout(self.send_timeout, self.sender.send(payload)).await {
            Ok(Ok(())) => SendOutcome::Delivered,
            Ok(Err(_)) => {
                debug!(conn_id = %self.id, "Outbound queue closed");
                self.close();
                SendOutcome::Closed
            }
            Err(_) => {
                warn!(conn_id = %self.id, "Outbound send timed out");
                SendOutcome::TimedOut
            }
        }
    }

    /// Serialize and queue a message.
    pub async fn send_message(&self, message: &OutboundMessage) -> SendOutcome {
        match serde_json::to_string(message) {
            Ok(payload) => self.send(payload).await,
            Err(e) => {
                warn!(conn_id = %self.id, error = %e, "Failed to serialize outbound message");
                SendOutcome::Closed
            }
        }
    }

    /// Check if connection is alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark the connection dead and wake whoever waits in [`closed`](Self::closed).
    pub fn close(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            self.close_signal.notify_one();
        }
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub async fn closed(&self) {
        while self.is_alive() {
            self.close_signal.notified().await;
        }
    }

    /// Record a pong response.
    pub fn record_pong(&self) {
        self.last_pong_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// When the last pong arrived.
    pub fn last_pong(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_pong_ms.load(Ordering::Relaxed))
            .unwrap_or(self.connected_at)
    }

    /// Remember that this connection joined `room_id`.
    pub fn add_room(&self, room_id: RoomId) -> bool {
        self.rooms().insert(room_id)
    }

    /// Forget `room_id`.
    pub fn remove_room(&self, room_id: &RoomId) -> bool {
        self.rooms().remove(room_id)
    }

    /// Whether this connection joined `room_id`.
    pub fn in_room(&self, room_id: &RoomId) -> bool {
        self.rooms().contains(room_id)
    }

    /// Take every joined room, leaving the set empty.
    pub fn drain_rooms(&self) -> Vec<RoomId> {
        self.rooms().drain().collect()
    }

    fn rooms(&self) -> std::sync::MutexGuard<'_, HashSet<RoomId>> {
        self.joined_rooms.lock().unwrap_or_else(|e| e.into_inner())
    }
}
