//! Per-user notification settings.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use murmur_core::traits::Document;
use murmur_core::types::{ChatId, UserId};

use super::kind::NotificationType;

/// Notification preferences for one user.
///
/// Created with defaults the first time they are read. `dnd_start` and
/// `dnd_end` are wall-clock times in the user's zone, given by
/// `dnd_utc_offset_minutes`; a window whose start is later than its end
/// wraps midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Owner.
    pub user_id: UserId,
    /// Toggle for [`NotificationType::Message`].
    #[serde(default = "default_true")]
    pub message_enabled: bool,
    /// Toggle for [`NotificationType::Mention`].
    #[serde(default = "default_true")]
    pub mention_enabled: bool,
    /// Toggle for [`NotificationType::File`].
    #[serde(default = "default_true")]
    pub file_enabled: bool,
    /// Toggle for [`NotificationType::GroupInvite`].
    #[serde(default = "default_true")]
    pub group_invite_enabled: bool,
    /// Whether the do-not-disturb window applies.
    #[serde(default)]
    pub dnd_enabled: bool,
    /// Start of the do-not-disturb window (`HH:MM`).
    #[serde(default = "default_dnd_start", with = "hhmm")]
    pub dnd_start: NaiveTime,
    /// End of the do-not-disturb window (`HH:MM`), exclusive.
    #[serde(default = "default_dnd_end", with = "hhmm")]
    pub dnd_end: NaiveTime,
    /// Offset of the user's zone from UTC.
    #[serde(default)]
    pub dnd_utc_offset_minutes: i32,
    /// Chats that never notify.
    #[serde(default)]
    pub muted_chat_ids: BTreeSet<ChatId>,
    /// Whether clients should play a sound.
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl NotificationSettings {
    /// Default settings: everything enabled, DND off (22:00-08:00 when switched on).
    pub fn default_for_user(user_id: UserId) -> Self {
        Self {
            user_id,
            message_enabled: true,
            mention_enabled: true,
            file_enabled: true,
            group_invite_enabled: true,
            dnd_enabled: false,
            dnd_start: default_dnd_start(),
            dnd_end: default_dnd_end(),
            dnd_utc_offset_minutes: 0,
            muted_chat_ids: BTreeSet::new(),
            sound_enabled: true,
            updated_at: Utc::now(),
        }
    }

    /// Whether the per-type toggle allows `kind`. Types without a toggle are always allowed.
    pub fn type_enabled(&self, kind: NotificationType) -> bool {
        match kind {
            NotificationType::Message => self.message_enabled,
            NotificationType::Mention => self.mention_enabled,
            NotificationType::File => self.file_enabled,
            NotificationType::GroupInvite => self.group_invite_enabled,
            _ => true,
        }
    }

    /// Whether `chat_id` is muted.
    pub fn is_muted(&self, chat_id: &ChatId) -> bool {
        self.muted_chat_ids.contains(chat_id)
    }
}

impl Document for NotificationSettings {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.user_id
    }
}

fn default_true() -> bool {
    true
}

fn default_dnd_start() -> NaiveTime {
    NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default()
}

fn default_dnd_end() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}

/// `HH:MM` (de)serialization for [`NaiveTime`]. `HH:MM:SS` is accepted on input.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize as `HH:MM`.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    /// Parse `HH:MM` or `HH:MM:SS`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}
