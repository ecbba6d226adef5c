//! Chat message entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::traits::Document;
use murmur_core::types::{MessageId, RoomId, TopicId, UserId};

use super::status::MessageStatus;

/// A persisted chat message.
///
/// Exactly one of `receiver_id`, `room_id`, `topic` is set, matching the
/// destination the message was routed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Author.
    pub sender_id: UserId,
    /// Recipient of a private message.
    pub receiver_id: Option<UserId>,
    /// Room the message was posted to.
    pub room_id: Option<RoomId>,
    /// Group or channel topic the message was published to.
    pub topic: Option<TopicId>,
    /// Text body.
    pub content: String,
    /// Attachment URL from the object store.
    pub file_url: Option<String>,
    /// Delivery progress.
    pub status: MessageStatus,
    /// When the server accepted the message.
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// A private message between two users.
    pub fn private(
        sender_id: UserId,
        receiver_id: UserId,
        content: impl Into<String>,
        file_url: Option<String>,
    ) -> Self {
        Self {
            receiver_id: Some(receiver_id),
            file_url,
            ..Self::blank(sender_id, content)
        }
    }

    /// A message posted to an ephemeral room.
    pub fn in_room(sender_id: UserId, room_id: RoomId, content: impl Into<String>) -> Self {
        Self {
            room_id: Some(room_id),
            ..Self::blank(sender_id, content)
        }
    }

    /// A message published to a group or channel topic.
    pub fn on_topic(sender_id: UserId, topic: TopicId, content: impl Into<String>) -> Self {
        Self {
            topic: Some(topic),
            ..Self::blank(sender_id, content)
        }
    }

    fn blank(sender_id: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            sender_id,
            receiver_id: None,
            room_id: None,
            topic: None,
            content: content.into(),
            file_url: None,
            status: MessageStatus::Sent,
            created_at: Utc::now(),
        }
    }
}

impl Document for ChatMessage {
    type Id = MessageId;

    fn id(&self) -> MessageId {
        self.id
    }
}
