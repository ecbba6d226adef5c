//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::types::{RoomId, UserId};
use murmur_entity::message::ChatMessage;
use murmur_entity::user::User;
use murmur_realtime::metrics::MetricsSnapshot;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// A bearer token plus the account it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Bearer token.
    pub token: String,
    /// Token expiry.
    pub expires_at: DateTime<Utc>,
    /// The account.
    pub user: UserResponse,
}

/// User summary for responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// User ID.
    pub id: UserId,
    /// Email, if any.
    pub email: Option<String>,
    /// Phone number, if any.
    pub phone_number: Option<String>,
    /// Display name.
    pub display_name: String,
    /// Whether an OTP was ever verified for this account.
    pub verified: bool,
    /// Online flag.
    pub online: bool,
    /// Last time the user went offline.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            phone_number: user.phone_number,
            display_name: user.display_name,
            verified: user.verified,
            online: user.online,
            last_seen_at: user.last_seen_at,
            created_at: user.created_at,
        }
    }
}

/// A code went out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpSentResponse {
    /// Canonical identifier the code was sent to.
    pub identifier: String,
    /// Seconds until the code expires.
    pub expires_in: u64,
}

/// A user's presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceResponse {
    /// User ID.
    pub user_id: UserId,
    /// Whether any connection is open.
    pub online: bool,
    /// Open connections.
    pub active_connections: u32,
    /// Last time the user went offline.
    pub last_seen_at: Option<DateTime<Utc>>,
}

/// Current members of a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMembersResponse {
    /// Room ID.
    pub room_id: RoomId,
    /// Members.
    pub members: Vec<UserId>,
}

/// A bare count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    /// Count value.
    pub count: usize,
}

/// One private conversation, with the peer's display name when known.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    /// The other participant.
    pub peer_id: UserId,
    /// Their display name.
    pub peer_name: Option<String>,
    /// Whether they have a live connection.
    pub peer_online: bool,
    /// Unread messages from them.
    pub unread_count: usize,
    /// Newest message in either direction.
    pub last_message: ChatMessage,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Live WebSocket connections.
    pub connections: usize,
    /// Users currently online.
    pub online_users: usize,
    /// Engine counters.
    pub metrics: MetricsSnapshot,
}
