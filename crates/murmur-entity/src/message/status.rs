//! Message delivery status.

use serde::{Deserialize, Serialize};

/// How far a private message has progressed toward its reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted and persisted by the server.
    #[default]
    Sent,
    /// Pushed to at least one of the receiver's connections.
    Delivered,
    /// Acknowledged by the receiver.
    Read,
}

impl MessageStatus {
    /// Return the status as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
