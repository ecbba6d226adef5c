//! Notification dispatcher: gate, persist, deliver.

use std::sync::Arc;

use tracing::{debug, info};

use murmur_core::error::AppError;
use murmur_core::result::AppResult;
use murmur_core::traits::Repository;
use murmur_core::types::{ChatId, NotificationId, UserId};
use murmur_entity::notification::{Notification, NotificationType};

use crate::message::types::OutboundMessage;
use crate::metrics::RealtimeMetrics;
use crate::router::{Destination, MessageRouter};

use super::gate::NotificationGate;

/// Stores notifications that pass the gate and pushes them to the
/// recipient's live connections. Offline users find them on their next
/// listing.
#[derive(Clone)]
pub struct NotificationDispatcher {
    gate: NotificationGate,
    notifications: Arc<dyn Repository<Notification, NotificationId>>,
    router: Arc<MessageRouter>,
    metrics: Arc<RealtimeMetrics>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish()
    }
}

impl NotificationDispatcher {
    /// Create a new dispatcher
    pub fn new(
        gate: NotificationGate,
        notifications: Arc<dyn Repository<Notification, NotificationId>>,
        router: Arc<MessageRouter>,
        metrics: Arc<RealtimeMetrics>,
    ) -> Self {
        Self {
            gate,
            notifications,
            router,
            metrics,
        }
    }

    /// Notify `user_id`. Returns the stored notification, or `None` when
    /// the user's settings suppressed it.
    pub async fn notify(
        &self,
        user_id: UserId,
        kind: NotificationType,
        chat_id: Option<ChatId>,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> AppResult<Option<Notification>> {
        if !self.gate.should_notify(user_id, chat_id.as_ref(), kind).await? {
            debug!(user_id = %user_id, kind = kind.as_str(), "Notification suppressed");
            self.metrics.notification_suppressed();
            return Ok(None);
        }

        let notification = self
            .notifications
            .save(Notification::new(user_id, kind, chat_id, title, body))
            .await?;

        let report = self
            .router
            .route(
                &Destination::ToUser(user_id),
                &OutboundMessage::Notification {
                    notification: notification.clone(),
                },
            )
            .await;
        self.metrics.notification_sent();

        info!(
            user_id = %user_id,
            notification_id = %notification.id,
            kind = kind.as_str(),
            live_targets = report.delivered.len(),
            "Notification dispatched"
        );
        Ok(Some(notification))
    }

    /// Every stored notification for `user_id`, newest first.
    pub async fn list(&self, user_id: UserId) -> AppResult<Vec<Notification>> {
        let mut items = self
            .notifications
            .find_by_field("user_id", &serde_json::json!(user_id))
            .await?;
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// How many of `user_id`'s notifications are unread.
    pub async fn unread_count(&self, user_id: UserId) -> AppResult<usize> {
        Ok(self.list(user_id).await?.iter().filter(|n| !n.read).count())
    }

    /// Mark one notification read. Someone else's notification is reported
    /// as missing.
    pub async fn mark_read(&self, user_id: UserId, id: NotificationId) -> AppResult<Notification> {
        let mut notification = self
            .notifications
            .find_by_id(&id)
            .await?
            .filter(|n| n.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("Notification {id} not found")))?;

        if !notification.read {
            notification.read = true;
            notification = self.notifications.save(notification).await?;
        }
        Ok(notification)
    }

    /// Mark every unread notification of `user_id` read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: UserId) -> AppResult<usize> {
        let unread: Vec<Notification> =
            self.list(user_id).await?.into_iter().filter(|n| !n.read).collect();
        let count = unread.len();
        for mut notification in unread {
            notification.read = true;
            self.notifications.save(notification).await?;
        }
        debug!(user_id = %user_id, count, "Notifications marked read");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use tokio::sync::mpsc;

    use murmur_core::clock::ManualClock;
    use murmur_core::types::Principal;
    use murmur_entity::notification::NotificationSettings;
    use murmur_store::MemoryRepository;

    use super::*;
    use crate::connection::handle::ConnectionHandle;
    use crate::connection::pool::ConnectionPool;
    use crate::presence::tracker::PresenceTracker;
    use crate::topic::registry::TopicRegistry;

    struct Fixture {
        pool: Arc<ConnectionPool>,
        settings: Arc<MemoryRepository<NotificationSettings>>,
        dispatcher: NotificationDispatcher,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let pool = Arc::new(ConnectionPool::new());
        let metrics = Arc::new(RealtimeMetrics::new());
        let router = Arc::new(MessageRouter::new(
            pool.clone(),
            Arc::new(PresenceTracker::new(clock.clone(), 8)),
            Arc::new(TopicRegistry::new()),
            metrics.clone(),
        ));
        let settings = Arc::new(MemoryRepository::<NotificationSettings>::new());
        let gate = NotificationGate::new(settings.clone(), clock);
        let dispatcher = NotificationDispatcher::new(
            gate,
            Arc::new(MemoryRepository::<Notification>::new()),
            router,
            metrics,
        );
        Fixture {
            pool,
            settings,
            dispatcher,
        }
    }

    #[tokio::test]
    async fn test_notify_persists_and_delivers() {
        let fx = fixture();
        let user = UserId::new();
        let (tx, mut rx) = mpsc::channel(4);
        fx.pool.add(Arc::new(ConnectionHandle::new(
            Some(Principal::new(user, "bob")),
            tx,
            Duration::from_millis(50),
        )));

        let stored = fx
            .dispatcher
            .notify(user, NotificationType::Message, None, "New message", "hi")
            .await
            .unwrap();

        assert!(stored.is_some());
        assert!(rx.recv().await.unwrap().contains(r#""type":"notification""#));
        assert_eq!(fx.dispatcher.list(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_muted_chat_is_suppressed() {
        let fx = fixture();
        let user = UserId::new();
        let chat = ChatId::from("alice");
        let mut settings = NotificationSettings::default_for_user(user);
        settings.muted_chat_ids.insert(chat.clone());
        fx.settings.save(settings).await.unwrap();

        let stored = fx
            .dispatcher
            .notify(user, NotificationType::Message, Some(chat), "t", "b")
            .await
            .unwrap();

        assert!(stored.is_none());
        assert!(fx.dispatcher.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_state_is_per_owner() {
        let fx = fixture();
        let (bob, eve) = (UserId::new(), UserId::new());
        let mut ids = Vec::new();
        for body in ["one", "two", "three"] {
            let stored = fx
                .dispatcher
                .notify(bob, NotificationType::Message, None, "New message", body)
                .await
                .unwrap()
                .unwrap();
            ids.push(stored.id);
        }
        assert_eq!(fx.dispatcher.unread_count(bob).await.unwrap(), 3);

        let err = fx.dispatcher.mark_read(eve, ids[0]).await.unwrap_err();
        assert_eq!(err.kind, murmur_core::error::ErrorKind::NotFound);
        assert_eq!(fx.dispatcher.unread_count(bob).await.unwrap(), 3);

        assert!(fx.dispatcher.mark_read(bob, ids[0]).await.unwrap().read);
        assert_eq!(fx.dispatcher.unread_count(bob).await.unwrap(), 2);

        assert_eq!(fx.dispatcher.mark_all_read(bob).await.unwrap(), 2);
        assert_eq!(fx.dispatcher.unread_count(bob).await.unwrap(), 0);
        assert_eq!(fx.dispatcher.mark_all_read(bob).await.unwrap(), 0);
    }
}
