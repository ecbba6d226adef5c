//! Which connections are subscribed to which topics.

use std::collections::HashSet;

use dashmap::DashMap;

use murmur_core::types::{ConnectionId, TopicId};

/// Result of a subscribe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The subscription was recorded.
    Added,
    /// The connection was already subscribed.
    AlreadySubscribed,
    /// The connection is at its subscription limit.
    LimitReached,
}

/// Tracks connection-to-topic subscription mappings (reverse index).
///
/// Changes for one connection run under that connection's entry lock. The
/// `on_*` callbacks run while the lock is held, so the caller's forward
/// index changes in the same critical section.
#[derive(Debug, Default)]
pub struct SubscriptionTracker {
    /// Connection ID → set of topics.
    conn_to_topics: DashMap<ConnectionId, HashSet<TopicId>>,
}

impl SubscriptionTracker {
    /// Creates a new subscription tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a subscription unless the connection already holds `limit`
    /// topics. The count check and the insert happen under one lock.
    pub fn add(
        &self,
        conn_id: ConnectionId,
        topic: TopicId,
        limit: Option<usize>,
        on_added: impl FnOnce(&TopicId),
    ) -> SubscribeOutcome {
        let mut topics = self.conn_to_topics.entry(conn_id).or_default();
        if topics.contains(&topic) {
            return SubscribeOutcome::AlreadySubscribed;
        }
        if limit.is_some_and(|max| topics.len() >= max) {
            return SubscribeOutcome::LimitReached;
        }
        on_added(&topic);
        topics.insert(topic);
        SubscribeOutcome::Added
    }

    /// Removes a subscription.
    pub fn remove(&self, conn_id: ConnectionId, topic: &TopicId, on_removed: impl FnOnce()) -> bool {
        let Some(mut topics) = self.conn_to_topics.get_mut(&conn_id) else {
            return false;
        };
        let removed = topics.remove(topic);
        if removed {
            on_removed();
        }
        removed
    }

    /// Returns the number of subscriptions for a connection.
    pub fn count(&self, conn_id: ConnectionId) -> usize {
        self.conn_to_topics
            .get(&conn_id)
            .map(|entry| entry.value().len())
            .unwrap_or(0)
    }

    /// Removes all subscriptions for a connection.
    pub fn remove_all(&self, conn_id: ConnectionId) -> HashSet<TopicId> {
        self.conn_to_topics
            .remove(&conn_id)
            .map(|(_, topics)| topics)
            .unwrap_or_default()
    }
}
