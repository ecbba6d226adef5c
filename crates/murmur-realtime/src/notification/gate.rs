//! Per-recipient notification decision.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveTime, Utc};

use murmur_core::clock::Clock;
use murmur_core::result::AppResult;
use murmur_core::traits::Repository;
use murmur_core::types::{ChatId, UserId};
use murmur_entity::notification::{NotificationSettings, NotificationType};

/// Decides whether a notification should reach a user.
///
/// Reads the user's settings and nothing else. Users without stored
/// settings get the defaults; nothing is written on their behalf.
#[derive(Clone)]
pub struct NotificationGate {
    settings: Arc<dyn Repository<NotificationSettings, UserId>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for NotificationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGate").finish()
    }
}

impl NotificationGate {
    /// Creates a gate reading from `settings`.
    pub fn new(
        settings: Arc<dyn Repository<NotificationSettings, UserId>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { settings, clock }
    }

    /// Whether `user_id` should be notified about a `kind` event in `chat_id`.
    pub async fn should_notify(
        &self,
        user_id: UserId,
        chat_id: Option<&ChatId>,
        kind: NotificationType,
    ) -> AppResult<bool> {
        let settings = self
            .settings
            .find_by_id(&user_id)
            .await?
            .unwrap_or_else(|| NotificationSettings::default_for_user(user_id));

        Ok(Self::evaluate(&settings, chat_id, kind, self.clock.now()))
    }

    /// The decision itself: DND window, then mute list, then the type toggle.
    pub fn evaluate(
        settings: &NotificationSettings,
        chat_id: Option<&ChatId>,
        kind: NotificationType,
        now: DateTime<Utc>,
    ) -> bool {
        if settings.dnd_enabled {
            let local = (now + Duration::minutes(i64::from(settings.dnd_utc_offset_minutes))).time();
            if in_dnd_window(local, settings.dnd_start, settings.dnd_end) {
                return false;
            }
        }

        if chat_id.is_some_and(|id| settings.is_muted(id)) {
            return false;
        }

        settings.type_enabled(kind)
    }
}

/// Whether `now` falls in `[start, end)`, wrapping past midnight when
/// `start > end`. A window with `start == end` is empty.
pub fn in_dnd_window(now: NaiveTime, start: NaiveTime, end: NaiveTime) -> bool {
    if start <= end {
        start <= now && now < end
    } else {
        now >= start || now < end
    }
}
