//! Publishes presence changes and mirrors them onto stored profiles.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use murmur_core::traits::Repository;
use murmur_core::types::{TopicId, UserId};
use murmur_entity::user::User;

use crate::message::types::OutboundMessage;
use crate::router::{Destination, MessageRouter};

use super::record::PresenceEvent;
use super::tracker::PresenceTracker;

/// Applies presence events in version order per user.
///
/// Events older than the last one applied for the same user are dropped,
/// so the `presence` topic and the stored profile never move backwards.
/// After the event channel lags, [`resync`](Self::resync) rebuilds state
/// from the tracker itself.
pub struct PresenceForwarder {
    presence: Arc<PresenceTracker>,
    router: Arc<MessageRouter>,
    users: Arc<dyn Repository<User, UserId>>,
    applied: HashMap<UserId, u64>,
}

impl std::fmt::Debug for PresenceForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceForwarder")
            .field("tracked_users", &self.applied.len())
            .finish()
    }
}

impl PresenceForwarder {
    /// Create a forwarder that has applied nothing yet.
    pub fn new(
        presence: Arc<PresenceTracker>,
        router: Arc<MessageRouter>,
        users: Arc<dyn Repository<User, UserId>>,
    ) -> Self {
        Self {
            presence,
            router,
            users,
            applied: HashMap::new(),
        }
    }

    /// Publish and persist `event` unless a newer one was already applied.
    /// Returns whether it was applied.
    pub async fn apply(&mut self, event: PresenceEvent) -> bool {
        let last = self.applied.get(&event.user_id).copied().unwrap_or(0);
        if event.version <= last {
            debug!(
                user_id = %event.user_id,
                version = event.version,
                applied = last,
                "Dropping stale presence event"
            );
            return false;
        }
        self.applied.insert(event.user_id, event.version);

        self.router
            .route(
                &Destination::ToTopic(TopicId::presence()),
                &OutboundMessage::PresenceChanged {
                    user_id: event.user_id,
                    online: event.online,
                    last_seen: event.last_seen,
                },
            )
            .await;
        self.persist(&event).await;
        true
    }

    /// Apply the tracker's current state for every user whose version is
    /// ahead of what was last applied. Returns how many users were updated.
    pub async fn resync(&mut self) -> usize {
        let mut updated = 0;
        for record in self.presence.snapshot() {
            if self.apply(PresenceEvent::from_record(&record)).await {
                updated += 1;
            }
        }
        info!(updated, "Presence resynchronised from tracker");
        updated
    }

    async fn persist(&self, event: &PresenceEvent) {
        let mut user = match self.users.find_by_id(&event.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!(user_id = %event.user_id, error = %e, "Presence lookup failed");
                return;
            }
        };

        user.online = event.online;
        if event.last_seen.is_some() {
            user.last_seen_at = event.last_seen;
        }
        if let Err(e) = self.users.save(user).await {
            warn!(user_id = %event.user_id, error = %e, "Failed to persist presence");
        }
    }
}
