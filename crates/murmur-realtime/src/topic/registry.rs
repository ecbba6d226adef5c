//! Topic registry: topics and their subscribers.

use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use murmur_core::types::{ConnectionId, TopicId};

use super::subscription::{SubscribeOutcome, SubscriptionTracker};

/// Registry of all topics with at least one subscriber.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    /// Topic → subscribed connections.
    topics: DashMap<TopicId, HashSet<ConnectionId>>,
    /// Subscription tracker (reverse index).
    subscriptions: SubscriptionTracker,
}

impl TopicRegistry {
    /// Creates a new topic registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes a connection to a topic. With a `limit`, a connection
    /// already holding that many topics is refused; concurrent subscribes
    /// on one connection cannot overshoot it.
    pub fn subscribe(
        &self,
        topic: TopicId,
        conn_id: ConnectionId,
        limit: Option<usize>,
    ) -> SubscribeOutcome {
        self.subscriptions.add(conn_id, topic, limit, |topic| {
            self.topics
                .entry(topic.clone())
                .or_default()
                .insert(conn_id);
        })
    }

    /// Unsubscribes a connection from a topic.
    pub fn unsubscribe(&self, topic: &TopicId, conn_id: ConnectionId) -> bool {
        self.subscriptions
            .remove(conn_id, topic, || self.detach(topic, conn_id))
    }

    /// Unsubscribes a connection from all topics.
    pub fn unsubscribe_all(&self, conn_id: ConnectionId) -> usize {
        let topics = self.subscriptions.remove_all(conn_id);
        for topic in &topics {
            self.detach(topic, conn_id);
        }
        topics.len()
    }

    /// Snapshot of a topic's subscribers.
    pub fn subscribers(&self, topic: &TopicId) -> Vec<ConnectionId> {
        self.topics
            .get(topic)
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the subscription count for a connection.
    pub fn subscription_count(&self, conn_id: ConnectionId) -> usize {
        self.subscriptions.count(conn_id)
    }

    /// Returns total number of active topics.
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    fn detach(&self, topic: &TopicId, conn_id: ConnectionId) {
        if let Entry::Occupied(mut subs) = self.topics.entry(topic.clone()) {
            subs.get_mut().remove(&conn_id);
            if subs.get().is_empty() {
                subs.remove();
            }
        }
    }
}
