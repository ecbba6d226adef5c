//! Inbound and outbound WebSocket message type definitions.
//!
//! Frames are JSON text objects tagged by a `type` field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::types::{MessageId, RoomId, TopicId, UserId};
use murmur_entity::message::{ChatMessage, MessageStatus};
use murmur_entity::notification::Notification;

/// Messages sent by the client to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    /// First-frame credentials, for clients that cannot set upgrade headers.
    Connect {
        /// `Bearer <token>`.
        #[serde(default)]
        authorization: Option<String>,
    },
    /// Subscribe to a topic.
    Subscribe {
        /// Topic name.
        topic: TopicId,
    },
    /// Unsubscribe from a topic.
    Unsubscribe {
        /// Topic name.
        topic: TopicId,
    },
    /// Join an ephemeral room.
    JoinRoom {
        /// Room name.
        room_id: RoomId,
    },
    /// Leave an ephemeral room.
    LeaveRoom {
        /// Room name.
        room_id: RoomId,
    },
    /// Direct message to one user.
    PrivateMessage {
        /// Recipient.
        receiver_id: UserId,
        /// Text body.
        content: String,
        /// Attachment URL.
        #[serde(default)]
        file_url: Option<String>,
    },
    /// Message to every member of a room.
    RoomMessage {
        /// Target room.
        room_id: RoomId,
        /// Text body.
        content: String,
    },
    /// Group or channel broadcast.
    Publish {
        /// `group:{id}` or `channel:{id}`.
        topic: TopicId,
        /// Text body.
        content: String,
    },
    /// Typing indicator for a private conversation.
    Typing {
        /// The peer being typed to.
        receiver_id: UserId,
        /// Started (`true`) or stopped typing.
        typing: bool,
    },
    /// Toggle an emoji reaction on a room message.
    Reaction {
        /// Room the message lives in.
        room_id: RoomId,
        /// Reacted-to message.
        message_id: MessageId,
        /// The emoji.
        emoji: String,
    },
    /// Read/delivery receipt for a private message. The receipt goes to
    /// the stored author; a client-sent `sender_id` is ignored.
    MessageStatus {
        /// The message being acknowledged.
        message_id: MessageId,
        /// New status.
        status: MessageStatus,
    },
    /// Call setup signalling (offer/answer/candidate/hangup).
    CallSignal {
        /// Peer being signalled.
        target_id: UserId,
        /// Signal kind.
        signal: String,
        /// Opaque signalling payload.
        #[serde(default)]
        payload: serde_json::Value,
    },
    /// Pong response to server ping.
    Pong {
        /// Echoed timestamp.
        timestamp: i64,
    },
}

/// One user's reaction on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry {
    /// Who reacted.
    pub user_id: UserId,
    /// Their display name.
    pub user_name: String,
    /// The emoji.
    pub emoji: String,
    /// When the reaction was added.
    pub reacted_at: DateTime<Utc>,
}

/// Messages sent by the server to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Handshake result.
    Connected {
        /// Whether a principal is bound to the connection.
        authenticated: bool,
        /// The bound user, if any.
        user_id: Option<UserId>,
    },
    /// A chat message (private, room, or topic).
    Message {
        /// The persisted message.
        message: ChatMessage,
        /// Author's display name.
        sender_name: String,
    },
    /// A user came online or went offline.
    PresenceChanged {
        /// Whose presence changed.
        user_id: UserId,
        /// Current state.
        online: bool,
        /// Set when going offline.
        last_seen: Option<DateTime<Utc>>,
    },
    /// A room's member list after a join or leave.
    RoomMembers {
        /// The room.
        room_id: RoomId,
        /// Current members.
        members: Vec<UserId>,
    },
    /// Typing indicator.
    Typing {
        /// Who is typing.
        sender_id: UserId,
        /// Started or stopped.
        typing: bool,
    },
    /// All reactions on a message after a toggle.
    Reactions {
        /// The message.
        message_id: MessageId,
        /// Every current reaction.
        reactions: Vec<ReactionEntry>,
    },
    /// Receipt forwarded to a message's author.
    MessageStatus {
        /// The message.
        message_id: MessageId,
        /// Who produced the receipt.
        reader_id: UserId,
        /// New status.
        status: MessageStatus,
    },
    /// Call signalling forwarded to the peer.
    CallSignal {
        /// Caller.
        from_id: UserId,
        /// Signal kind.
        signal: String,
        /// Opaque payload.
        payload: serde_json::Value,
    },
    /// Notification delivery.
    Notification {
        /// The stored notification.
        notification: Notification,
    },
    /// Subscription confirmed.
    Subscribed {
        /// Topic name.
        topic: TopicId,
    },
    /// Ping (server keepalive).
    Ping {
        /// Server timestamp in milliseconds.
        timestamp: i64,
    },
    /// Error message.
    Error {
        /// Error code.
        code: String,
        /// Error description.
        message: String,
    },
}

impl OutboundMessage {
    /// Build an error frame.
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}
