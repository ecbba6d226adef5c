//! Chat operations: persist, route, notify.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use tracing::{debug, info, warn};

use murmur_core::clock::Clock;
use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_core::traits::Repository;
use murmur_core::types::{ChatId, MessageId, Principal, RoomId, TopicId, UserId};
use murmur_entity::message::{ChatMessage, MessageStatus};
use murmur_entity::notification::NotificationType;

use crate::message::types::OutboundMessage;
use crate::notification::dispatcher::NotificationDispatcher;
use crate::presence::tracker::PresenceTracker;
use crate::router::{DeliveryReport, Destination, MessageRouter};
use crate::topic::access::is_broadcast_topic;

use super::reactions::ReactionBook;

/// Longest notification body taken from a message.
const PREVIEW_CHARS: usize = 100;

/// One private conversation as seen by one participant.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    /// The other participant.
    pub peer_id: UserId,
    /// Newest message in either direction.
    pub last_message: ChatMessage,
    /// Messages from the peer not yet read.
    pub unread_count: usize,
    /// Whether the peer has a live connection.
    pub peer_online: bool,
}

/// Handles addressed sends from authenticated connections.
///
/// Messages are stored before routing, so a recipient with no live
/// connection still finds them in history.
#[derive(Clone)]
pub struct ChatService {
    messages: Arc<dyn Repository<ChatMessage, MessageId>>,
    router: Arc<MessageRouter>,
    presence: Arc<PresenceTracker>,
    dispatcher: NotificationDispatcher,
    reactions: Arc<ReactionBook>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService").finish()
    }
}

impl ChatService {
    /// Creates a new chat service.
    pub fn new(
        messages: Arc<dyn Repository<ChatMessage, MessageId>>,
        router: Arc<MessageRouter>,
        presence: Arc<PresenceTracker>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            router,
            presence,
            dispatcher,
            reactions: Arc::new(ReactionBook::new()),
            clock,
        }
    }

    /// Direct message. Delivered to every device of both participants; the
    /// receiver is also notified.
    pub async fn send_private(
        &self,
        sender: &Principal,
        receiver_id: UserId,
        content: String,
        file_url: Option<String>,
    ) -> AppResult<ChatMessage> {
        if content.trim().is_empty() && file_url.is_none() {
            return Err(AppError::validation("Message needs content or a file"));
        }

        let mut message = ChatMessage::private(sender.user_id, receiver_id, content, file_url);
        message.created_at = self.clock.now();
        let message = self.messages.save(message).await?;

        let frame = OutboundMessage::Message {
            message: message.clone(),
            sender_name: sender.display_name.clone(),
        };
        let report = self.router.route(&Destination::ToUser(receiver_id), &frame).await;
        if receiver_id != sender.user_id {
            self.router.route(&Destination::ToUser(sender.user_id), &frame).await;
        }
        info!(
            message_id = %message.id,
            sender_id = %sender.user_id,
            receiver_id = %receiver_id,
            live_targets = report.delivered.len(),
            "Private message sent"
        );

        let (kind, body) = if message.file_url.is_some() && message.content.trim().is_empty() {
            (NotificationType::File, "sent a file".to_string())
        } else {
            (NotificationType::Message, preview(&message.content))
        };
        if let Err(e) = self
            .dispatcher
            .notify(
                receiver_id,
                kind,
                Some(ChatId::from(sender.user_id.to_string())),
                format!("New message from {}", sender.display_name),
                body,
            )
            .await
        {
            warn!(receiver_id = %receiver_id, error = %e, "Failed to notify receiver");
        }

        Ok(message)
    }

    /// Message to the room's current members. The sender must be a member.
    pub async fn send_to_room(
        &self,
        sender: &Principal,
        room_id: RoomId,
        content: String,
    ) -> AppResult<DeliveryReport> {
        self.require_member(sender, &room_id)?;
        if content.trim().is_empty() {
            return Err(AppError::validation("Message content is empty"));
        }

        let mut message = ChatMessage::in_room(sender.user_id, room_id.clone(), content);
        message.created_at = self.clock.now();
        let message = self.messages.save(message).await?;

        Ok(self
            .router
            .route(
                &Destination::ToRoom(room_id),
                &OutboundMessage::Message {
                    message,
                    sender_name: sender.display_name.clone(),
                },
            )
            .await)
    }

    /// Group or channel broadcast to every subscriber of `topic`.
    pub async fn publish(
        &self,
        sender: &Principal,
        topic: TopicId,
        content: String,
    ) -> AppResult<DeliveryReport> {
        if !is_broadcast_topic(&topic) {
            return Err(AppError::validation(format!(
                "Topic '{topic}' does not accept published messages"
            )));
        }
        if content.trim().is_empty() {
            return Err(AppError::validation("Message content is empty"));
        }

        let mut message = ChatMessage::on_topic(sender.user_id, topic.clone(), content);
        message.created_at = self.clock.now();
        let message = self.messages.save(message).await?;

        Ok(self
            .router
            .route(
                &Destination::ToTopic(topic),
                &OutboundMessage::Message {
                    message,
                    sender_name: sender.display_name.clone(),
                },
            )
            .await)
    }

    /// Typing indicator. Not stored; an offline peer simply misses it.
    pub async fn typing(&self, sender: &Principal, receiver_id: UserId, typing: bool) {
        let report = self
            .router
            .route(
                &Destination::ToUser(receiver_id),
                &OutboundMessage::Typing {
                    sender_id: sender.user_id,
                    typing,
                },
            )
            .await;
        debug!(sender_id = %sender.user_id, receiver_id = %receiver_id, targets = report.attempted.len(), "Typing");
    }

    /// Toggle a reaction and send the message's reactions to the room.
    pub async fn react(
        &self,
        reactor: &Principal,
        room_id: RoomId,
        message_id: MessageId,
        emoji: String,
    ) -> AppResult<DeliveryReport> {
        self.require_member(reactor, &room_id)?;
        if emoji.trim().is_empty() {
            return Err(AppError::validation("Emoji is empty"));
        }

        let reactions = self
            .reactions
            .toggle(message_id, reactor, emoji.trim(), self.clock.now());

        Ok(self
            .router
            .route(
                &Destination::ToRoom(room_id),
                &OutboundMessage::Reactions {
                    message_id,
                    reactions,
                },
            )
            .await)
    }

    /// Read or delivery receipt. Only the message's receiver may send one;
    /// it is stored, then forwarded to the stored author, who must be online.
    pub async fn update_status(
        &self,
        reader: &Principal,
        message_id: MessageId,
        status: MessageStatus,
    ) -> AppResult<DeliveryReport> {
        let mut message = self
            .messages
            .find_by_id(&message_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Message {message_id} not found")))?;
        if message.receiver_id != Some(reader.user_id) {
            return Err(AppError::authorization(
                "Only the receiver can acknowledge a message",
            ));
        }

        let author = message.sender_id;
        if message.status != status {
            message.status = status;
            self.messages.save(message).await?;
        }

        let report = self
            .router
            .route(
                &Destination::ToUser(author),
                &OutboundMessage::MessageStatus {
                    message_id,
                    reader_id: reader.user_id,
                    status,
                },
            )
            .await;
        report.require_recipient()?;
        Ok(report)
    }

    /// Forward call signalling to the peer, who must be online.
    pub async fn call_signal(
        &self,
        caller: &Principal,
        target_id: UserId,
        signal: String,
        payload: serde_json::Value,
    ) -> AppResult<DeliveryReport> {
        let report = self
            .router
            .route(
                &Destination::ToUser(target_id),
                &OutboundMessage::CallSignal {
                    from_id: caller.user_id,
                    signal,
                    payload,
                },
            )
            .await;
        report.require_recipient()?;
        Ok(report)
    }

    /// One page of the private thread between `user_id` and `peer_id`.
    /// Pages count back from the newest message; each page is returned
    /// oldest first.
    pub async fn history(
        &self,
        user_id: UserId,
        peer_id: UserId,
        page: usize,
        size: usize,
    ) -> AppResult<Vec<ChatMessage>> {
        let mut thread = self.private_messages_of(user_id).await?;
        thread.retain(|m| peer_of(m, user_id) == Some(peer_id));
        thread.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut page: Vec<ChatMessage> = thread
            .into_iter()
            .skip(page.saturating_mul(size))
            .take(size)
            .collect();
        page.reverse();
        Ok(page)
    }

    /// Every private conversation `user_id` takes part in, most recent first.
    pub async fn conversations(&self, user_id: UserId) -> AppResult<Vec<ConversationSummary>> {
        let mut by_peer: HashMap<UserId, ConversationSummary> = HashMap::new();

        for message in self.private_messages_of(user_id).await? {
            let Some(peer_id) = peer_of(&message, user_id) else {
                continue;
            };
            let unread = message.sender_id == peer_id && message.status != MessageStatus::Read;
            let summary = by_peer.entry(peer_id).or_insert_with(|| ConversationSummary {
                peer_id,
                last_message: message.clone(),
                unread_count: 0,
                peer_online: self.presence.is_online(&peer_id),
            });
            if unread {
                summary.unread_count += 1;
            }
            if message.created_at > summary.last_message.created_at {
                summary.last_message = message;
            }
        }

        let mut conversations: Vec<ConversationSummary> = by_peer.into_values().collect();
        conversations.sort_by(|a, b| b.last_message.created_at.cmp(&a.last_message.created_at));
        Ok(conversations)
    }

    /// Mark everything `peer_id` sent to `reader` as read and tell the peer.
    /// Returns how many messages changed.
    pub async fn mark_conversation_read(
        &self,
        reader: &Principal,
        peer_id: UserId,
    ) -> AppResult<usize> {
        let unread: Vec<ChatMessage> = self
            .messages
            .find_by_field("receiver_id", &serde_json::json!(reader.user_id))
            .await?
            .into_iter()
            .filter(|m| m.sender_id == peer_id && m.status != MessageStatus::Read)
            .collect();

        for mut message in unread.iter().cloned() {
            message.status = MessageStatus::Read;
            self.messages.save(message).await?;
        }
        for message in &unread {
            self.router
                .route(
                    &Destination::ToUser(peer_id),
                    &OutboundMessage::MessageStatus {
                        message_id: message.id,
                        reader_id: reader.user_id,
                        status: MessageStatus::Read,
                    },
                )
                .await;
        }

        debug!(reader = %reader.user_id, peer = %peer_id, count = unread.len(), "Conversation read");
        Ok(unread.len())
    }

    /// Private messages sent or received by `user_id`.
    async fn private_messages_of(&self, user_id: UserId) -> AppResult<Vec<ChatMessage>> {
        let key = serde_json::json!(user_id);
        let mut messages: Vec<ChatMessage> = self
            .messages
            .find_by_field("sender_id", &key)
            .await?
            .into_iter()
            .filter(|m| m.receiver_id.is_some())
            .collect();
        messages.extend(
            self.messages
                .find_by_field("receiver_id", &key)
                .await?
                .into_iter()
                .filter(|m| m.sender_id != user_id),
        );
        Ok(messages)
    }

    fn require_member(&self, principal: &Principal, room_id: &RoomId) -> AppResult<()> {
        if self.presence.is_room_member(room_id, &principal.user_id) {
            Ok(())
        } else {
            Err(AppError::authorization(format!("Not a member of room '{room_id}'")))
        }
    }
}

/// The other participant of a private message, from `user_id`'s side.
fn peer_of(message: &ChatMessage, user_id: UserId) -> Option<UserId> {
    let receiver = message.receiver_id?;
    if message.sender_id == user_id {
        Some(receiver)
    } else if receiver == user_id {
        Some(message.sender_id)
    } else {
        None
    }
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
