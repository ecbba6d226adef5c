//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::traits::Document;
use murmur_core::types::{ChatId, NotificationId, UserId};

use super::kind::NotificationType;

/// A notification stored for a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: NotificationId,
    /// The recipient user.
    pub user_id: UserId,
    /// What happened.
    pub notification_type: NotificationType,
    /// Conversation the event belongs to, used for mute matching.
    pub chat_id: Option<ChatId>,
    /// Notification title.
    pub title: String,
    /// Notification body text.
    pub body: String,
    /// Whether the user has read it.
    pub read: bool,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(
        user_id: UserId,
        notification_type: NotificationType,
        chat_id: Option<ChatId>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: NotificationId::new(),
            user_id,
            notification_type,
            chat_id,
            title: title.into(),
            body: body.into(),
            read: false,
            created_at: Utc::now(),
        }
    }
}

impl Document for Notification {
    type Id = NotificationId;

    fn id(&self) -> NotificationId {
        self.id
    }
}
