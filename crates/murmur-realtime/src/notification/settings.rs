//! Stored notification settings.

use std::sync::Arc;

use tracing::info;

use murmur_core::clock::Clock;
use murmur_core::result::AppResult;
use murmur_core::traits::Repository;
use murmur_core::types::UserId;
use murmur_entity::notification::NotificationSettings;

/// Reads and updates a user's notification settings.
#[derive(Clone)]
pub struct NotificationSettingsService {
    repo: Arc<dyn Repository<NotificationSettings, UserId>>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for NotificationSettingsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSettingsService").finish()
    }
}

impl NotificationSettingsService {
    /// Creates a new settings service.
    pub fn new(
        repo: Arc<dyn Repository<NotificationSettings, UserId>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repo, clock }
    }

    /// The user's settings, storing the defaults on first read.
    pub async fn get_or_create(&self, user_id: UserId) -> AppResult<NotificationSettings> {
        if let Some(settings) = self.repo.find_by_id(&user_id).await? {
            return Ok(settings);
        }
        let mut settings = NotificationSettings::default_for_user(user_id);
        settings.updated_at = self.clock.now();
        self.repo.save(settings).await
    }

    /// Replace the user's settings. The owner is always `user_id`.
    pub async fn update(
        &self,
        user_id: UserId,
        mut settings: NotificationSettings,
    ) -> AppResult<NotificationSettings> {
        settings.user_id = user_id;
        settings.updated_at = self.clock.now();
        let saved = self.repo.save(settings).await?;
        info!(user_id = %user_id, dnd = saved.dnd_enabled, "Notification settings updated");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use murmur_core::clock::ManualClock;
    use murmur_store::MemoryRepository;

    use super::*;

    #[tokio::test]
    async fn test_first_read_stores_defaults() {
        let repo = Arc::new(MemoryRepository::<NotificationSettings>::new());
        let service = NotificationSettingsService::new(repo.clone(), Arc::new(ManualClock::new(Utc::now())));
        let user = UserId::new();

        let settings = service.get_or_create(user).await.unwrap();
        assert!(!settings.dnd_enabled);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_update_forces_owner() {
        let repo = Arc::new(MemoryRepository::<NotificationSettings>::new());
        let service = NotificationSettingsService::new(repo, Arc::new(ManualClock::new(Utc::now())));
        let user = UserId::new();

        let mut incoming = NotificationSettings::default_for_user(UserId::new());
        incoming.dnd_enabled = true;
        let saved = service.update(user, incoming).await.unwrap();

        assert_eq!(saved.user_id, user);
        assert!(service.get_or_create(user).await.unwrap().dnd_enabled);
    }
}
