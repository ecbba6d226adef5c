//! Connection lifecycle and inbound frames.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use murmur_core::config::realtime::RealtimeConfig;
use murmur_core::error::{AppError, ErrorKind};
use murmur_core::types::{ConnectionId, Principal, RoomId, TopicId, UserId};

use crate::chat::service::ChatService;
use crate::message::types::{InboundMessage, OutboundMessage};
use crate::metrics::RealtimeMetrics;
use crate::presence::tracker::PresenceTracker;
use crate::router::{Destination, MessageRouter};
use crate::topic::access::may_subscribe;
use crate::topic::registry::TopicRegistry;
use crate::topic::subscription::SubscribeOutcome;

use super::authenticator::HandshakeState;
use super::handle::ConnectionHandle;
use super::pool::ConnectionPool;

/// Keeps a registered connection alive; dropping it unregisters the
/// connection exactly once, however the transport task ends.
#[derive(Debug)]
pub struct ConnectionGuard {
    handle: Arc<ConnectionHandle>,
    manager: Arc<ConnectionManager>,
}

impl ConnectionGuard {
    /// The guarded connection.
    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.manager.unregister(&self.handle.id);
    }
}

/// Manages all active WebSocket connections.
#[derive(Debug)]
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    topics: Arc<TopicRegistry>,
    presence: Arc<PresenceTracker>,
    router: Arc<MessageRouter>,
    chat: ChatService,
    metrics: Arc<RealtimeMetrics>,
    config: RealtimeConfig,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    pub fn new(
        config: RealtimeConfig,
        pool: Arc<ConnectionPool>,
        topics: Arc<TopicRegistry>,
        presence: Arc<PresenceTracker>,
        router: Arc<MessageRouter>,
        chat: ChatService,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            pool,
            topics,
            presence,
            router,
            chat,
            metrics,
            config,
        }
    }

    /// Register a connection whose handshake has been resolved.
    ///
    /// An authenticated handshake is completed here, which counts the
    /// connection toward the user's presence. Anything else registers an
    /// anonymous connection. The `connected` frame is already queued on
    /// the returned receiver.
    pub async fn register(
        self: &Arc<Self>,
        state: HandshakeState,
    ) -> (ConnectionGuard, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.config.outbound_buffer_size.max(1));
        let send_timeout = Duration::from_millis(self.config.send_timeout_ms);

        let guard = match state {
            HandshakeState::Authenticated(pending) => {
                let handle = Arc::new(ConnectionHandle::new(
                    Some(pending.principal().clone()),
                    tx,
                    send_timeout,
                ));
                self.pool.add(handle.clone());
                pending.complete();
                ConnectionGuard {
                    handle,
                    manager: self.clone(),
                }
            }
            HandshakeState::Pending | HandshakeState::Rejected(_) => {
                let handle = Arc::new(ConnectionHandle::new(None, tx, send_timeout));
                self.pool.add(handle.clone());
                ConnectionGuard {
                    handle,
                    manager: self.clone(),
                }
            }
        };
        self.metrics.connection_opened();

        let handle = guard.handle();
        if let Some(user_id) = handle.user_id() {
            self.topics.subscribe(TopicId::user(&user_id), handle.id, None);
        }
        handle
            .send_message(&OutboundMessage::Connected {
                authenticated: handle.principal.is_some(),
                user_id: handle.user_id(),
            })
            .await;

        info!(
            conn_id = %handle.id,
            user_id = ?handle.user_id(),
            "WebSocket connection registered"
        );

        (guard, rx)
    }

    /// Remove a connection and release everything it held.
    ///
    /// Only the first call for a given ID does anything.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        let Some(handle) = self.pool.remove(conn_id) else {
            return;
        };
        handle.close();
        self.topics.unsubscribe_all(*conn_id);

        if let Some(user_id) = handle.user_id() {
            for room_id in handle.drain_rooms() {
                let other_device_in_room = self
                    .pool
                    .user_connections(&user_id)
                    .iter()
                    .any(|c| c.in_room(&room_id));
                if !other_device_in_room && self.presence.leave_room(&room_id, user_id) {
                    self.spawn_room_members(room_id);
                }
            }
            self.presence.on_connection_closed(user_id);
        }
        self.metrics.connection_closed();

        info!(
            conn_id = %conn_id,
            user_id = ?handle.user_id(),
            "WebSocket connection unregistered"
        );
    }

    /// Processes an inbound frame from a client.
    pub async fn handle_inbound(&self, handle: &Arc<ConnectionHandle>, raw_message: &str) {
        self.metrics.frame_received();

        let msg: InboundMessage = match serde_json::from_str(raw_message) {
            Ok(m) => m,
            Err(e) => {
                self.reply(
                    handle,
                    OutboundMessage::error("INVALID_MESSAGE", format!("Failed to parse message: {e}")),
                )
                .await;
                return;
            }
        };

        if let Err(e) = self.dispatch(handle, msg).await {
            debug!(conn_id = %handle.id, error = %e, "Inbound frame failed");
            self.reply(handle, error_frame(&e)).await;
        }
    }

    async fn dispatch(&self, handle: &Arc<ConnectionHandle>, msg: InboundMessage) -> Result<(), AppError> {
        match msg {
            InboundMessage::Connect { .. } => {
                self.reply(
                    handle,
                    OutboundMessage::error("ALREADY_CONNECTED", "Handshake already completed"),
                )
                .await;
            }
            InboundMessage::Pong { .. } => handle.record_pong(),
            InboundMessage::Subscribe { topic } => self.subscribe(handle, topic).await,
            InboundMessage::Unsubscribe { topic } => {
                self.topics.unsubscribe(&topic, handle.id);
                debug!(conn_id = %handle.id, topic = %topic, "Unsubscribed");
            }
            InboundMessage::JoinRoom { room_id } => {
                let principal = authenticated(handle)?;
                self.join_room(handle, principal.user_id, room_id).await;
            }
            InboundMessage::LeaveRoom { room_id } => {
                let principal = authenticated(handle)?;
                self.leave_room(principal.user_id, room_id).await;
            }
            InboundMessage::PrivateMessage {
                receiver_id,
                content,
                file_url,
            } => {
                let sender = authenticated(handle)?;
                self.chat
                    .send_private(sender, receiver_id, content, file_url)
                    .await?;
            }
            InboundMessage::RoomMessage { room_id, content } => {
                let sender = authenticated(handle)?;
                self.chat.send_to_room(sender, room_id, content).await?;
            }
            InboundMessage::Publish { topic, content } => {
                let sender = authenticated(handle)?;
                self.chat.publish(sender, topic, content).await?;
            }
            InboundMessage::Typing {
                receiver_id,
                typing,
            } => {
                let sender = authenticated(handle)?;
                self.chat.typing(sender, receiver_id, typing).await;
            }
            InboundMessage::Reaction {
                room_id,
                message_id,
                emoji,
            } => {
                let reactor = authenticated(handle)?;
                self.chat.react(reactor, room_id, message_id, emoji).await?;
            }
            InboundMessage::MessageStatus { message_id, status } => {
                let reader = authenticated(handle)?;
                self.chat.update_status(reader, message_id, status).await?;
            }
            InboundMessage::CallSignal {
                target_id,
                signal,
                payload,
            } => {
                let caller = authenticated(handle)?;
                self.chat
                    .call_signal(caller, target_id, signal, payload)
                    .await?;
            }
        }
        Ok(())
    }

    async fn subscribe(&self, handle: &ConnectionHandle, topic: TopicId) {
        if !may_subscribe(handle.principal.as_ref(), &topic) {
            self.reply(
                handle,
                OutboundMessage::error("FORBIDDEN", format!("Not authorized to subscribe to topic: {topic}")),
            )
            .await;
            return;
        }

        let limit = self.config.max_subscriptions_per_connection;
        if self.topics.subscribe(topic.clone(), handle.id, Some(limit))
            == SubscribeOutcome::LimitReached
        {
            self.reply(
                handle,
                OutboundMessage::error(
                    "MAX_SUBSCRIPTIONS",
                    format!("Maximum subscriptions ({limit}) reached"),
                ),
            )
            .await;
            return;
        }

        debug!(conn_id = %handle.id, topic = %topic, "Subscribed");
        self.reply(handle, OutboundMessage::Subscribed { topic }).await;
    }

    async fn join_room(&self, handle: &ConnectionHandle, user_id: UserId, room_id: RoomId) {
        handle.add_room(room_id.clone());
        self.presence.join_room(&room_id, user_id);
        self.broadcast_room_members(room_id).await;
    }

    /// An explicit leave applies to every device of the user.
    async fn leave_room(&self, user_id: UserId, room_id: RoomId) {
        for conn in self.pool.user_connections(&user_id) {
            conn.remove_room(&room_id);
        }
        if self.presence.leave_room(&room_id, user_id) {
            self.broadcast_room_members(room_id).await;
        }
    }

    async fn broadcast_room_members(&self, room_id: RoomId) {
        let members = self.presence.room_members(&room_id);
        self.router
            .route(
                &Destination::ToRoom(room_id.clone()),
                &OutboundMessage::RoomMembers { room_id, members },
            )
            .await;
    }

    /// Room updates from `unregister`, which runs inside `Drop` and cannot await.
    fn spawn_room_members(&self, room_id: RoomId) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(room_id = %room_id, "No runtime for room update");
            return;
        };
        let members = self.presence.room_members(&room_id);
        let router = self.router.clone();
        runtime.spawn(async move {
            router
                .route(
                    &Destination::ToRoom(room_id.clone()),
                    &OutboundMessage::RoomMembers { room_id, members },
                )
                .await;
        });
    }

    async fn reply(&self, handle: &ConnectionHandle, message: OutboundMessage) {
        let outcome = handle.send_message(&message).await;
        if outcome != super::handle::SendOutcome::Delivered {
            warn!(conn_id = %handle.id, outcome = ?outcome, "Reply not delivered");
        }
    }

    /// Close every connection. Their transport tasks drop the guards.
    pub fn close_all(&self) {
        let connections = self.pool.all_connections();
        info!(count = connections.len(), "Closing all connections");
        for conn in connections {
            conn.close();
        }
    }

    /// Live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }

    /// Users with at least one live connection.
    pub fn user_count(&self) -> usize {
        self.pool.user_count()
    }
}

fn authenticated(handle: &ConnectionHandle) -> Result<&Principal, AppError> {
    handle
        .principal
        .as_ref()
        .ok_or_else(|| AppError::authentication("Connection is not authenticated"))
}

/// The `error` frame for a failed inbound operation.
pub fn error_frame(error: &AppError) -> OutboundMessage {
    let code = match error.kind {
        ErrorKind::Authentication => "UNAUTHENTICATED".to_string(),
        ErrorKind::Authorization => "FORBIDDEN".to_string(),
        other => other.to_string(),
    };
    OutboundMessage::Error {
        code,
        message: error.message.clone(),
    }
}
