//! Notification type enumeration.

use serde::{Deserialize, Serialize};

/// The event that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A new private or group message.
    Message,
    /// The user was mentioned.
    Mention,
    /// A file was shared with the user.
    File,
    /// The user was invited to a group.
    GroupInvite,
    /// Someone reacted to the user's message.
    Reaction,
    /// An incoming call.
    Call,
    /// Server-originated notice.
    System,
}

impl NotificationType {
    /// Return the type as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Mention => "mention",
            Self::File => "file",
            Self::GroupInvite => "group_invite",
            Self::Reaction => "reaction",
            Self::Call => "call",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
