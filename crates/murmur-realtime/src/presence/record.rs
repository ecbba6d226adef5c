//! Presence state per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::types::UserId;

/// Presence of one user.
///
/// `online` always equals `active_connection_count > 0`. Handshakes that
/// have authenticated but not finished are counted separately in
/// `connecting_count` and never make a user online.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    /// The user.
    pub user_id: UserId,
    /// Whether any connection is open.
    pub online: bool,
    /// When the last connection closed.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Open connections.
    pub active_connection_count: u32,
    /// Authenticated handshakes not yet promoted to open connections.
    pub connecting_count: u32,
    /// Bumped on every `online` flip, under the user's lock.
    pub version: u64,
}

impl PresenceRecord {
    pub(crate) fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            online: false,
            last_seen_at: None,
            active_connection_count: 0,
            connecting_count: 0,
            version: 0,
        }
    }

    /// A record for a user the tracker has never seen.
    pub fn offline(user_id: UserId) -> Self {
        Self::new(user_id)
    }
}

/// Emitted when a user's `online` flag flips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEvent {
    /// Whose presence changed.
    pub user_id: UserId,
    /// New state.
    pub online: bool,
    /// Set on the transition to offline.
    pub last_seen: Option<DateTime<Utc>>,
    /// The record's version after this change. Events for one user may be
    /// received out of order; a lower version is stale.
    pub version: u64,
}

impl PresenceEvent {
    /// The event describing `record`'s current state.
    pub fn from_record(record: &PresenceRecord) -> Self {
        Self {
            user_id: record.user_id,
            online: record.online,
            last_seen: if record.online { None } else { record.last_seen_at },
            version: record.version,
        }
    }
}
