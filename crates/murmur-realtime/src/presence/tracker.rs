//! Reference-counted online state and room membership.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::{debug, info};

use murmur_core::clock::Clock;
use murmur_core::types::{RoomId, UserId};

use super::record::{PresenceEvent, PresenceRecord};
use super::rooms::RoomRegistry;

/// Tracks presence for all users.
///
/// Each operation runs under the user's DashMap shard lock, so opens and
/// closes for one user are applied in order. Change events are published
/// after the lock is released, so two events for one user can reach
/// subscribers in either order; each carries the record version assigned
/// under the lock. A slow or absent subscriber never blocks the tracker.
pub struct PresenceTracker {
    records: DashMap<UserId, PresenceRecord>,
    rooms: RoomRegistry,
    events: broadcast::Sender<PresenceEvent>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("users", &self.records.len())
            .field("rooms", &self.rooms.room_count())
            .finish()
    }
}

impl PresenceTracker {
    /// Create a tracker whose event channel buffers `event_buffer` events.
    pub fn new(clock: Arc<dyn Clock>, event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            records: DashMap::new(),
            rooms: RoomRegistry::new(),
            events,
            clock,
        }
    }

    /// Receive presence change events.
    pub fn subscribe(&self) -> broadcast::Receiver<PresenceEvent> {
        self.events.subscribe()
    }

    /// A connection for `user_id` opened. Emits an event on the 0 → 1 transition.
    pub fn on_connection_opened(&self, user_id: UserId) -> bool {
        let event = {
            let mut record = self.record_mut(user_id);
            Self::open(&mut record)
        };
        self.emit(event)
    }

    /// A connection for `user_id` closed. Emits an event on the 1 → 0 transition.
    ///
    /// # Panics
    ///
    /// Panics if the user has no open connection; that means a close was
    /// reported twice and the count can no longer be trusted.
    pub fn on_connection_closed(&self, user_id: UserId) -> bool {
        let now = self.clock.now();
        let event = {
            let mut record = self.record_mut(user_id);
            assert!(
                record.active_connection_count > 0,
                "presence count underflow for user {user_id}"
            );
            record.active_connection_count -= 1;
            if record.active_connection_count == 0 {
                record.online = false;
                record.last_seen_at = Some(now);
                record.version += 1;
                Some(PresenceEvent::from_record(&record))
            } else {
                None
            }
        };
        self.emit(event)
    }

    /// An authenticated handshake for `user_id` began. Does not affect `online`.
    pub fn begin_connecting(&self, user_id: UserId) {
        self.record_mut(user_id).connecting_count += 1;
    }

    /// A handshake finished: move one count from connecting to open.
    pub fn promote_connecting(&self, user_id: UserId) -> bool {
        let event = {
            let mut record = self.record_mut(user_id);
            record.connecting_count = record.connecting_count.saturating_sub(1);
            Self::open(&mut record)
        };
        self.emit(event)
    }

    /// A handshake was abandoned before it finished.
    pub fn abort_connecting(&self, user_id: UserId) {
        let mut record = self.record_mut(user_id);
        record.connecting_count = record.connecting_count.saturating_sub(1);
        debug!(user_id = %user_id, "Handshake aborted");
    }

    /// Snapshot of a user's record. Unknown users are offline.
    pub fn get(&self, user_id: &UserId) -> PresenceRecord {
        self.records
            .get(user_id)
            .map(|r| r.value().clone())
            .unwrap_or_else(|| PresenceRecord::offline(*user_id))
    }

    /// Snapshot of every record the tracker holds.
    pub fn snapshot(&self) -> Vec<PresenceRecord> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    /// Whether the user has at least one open connection.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.records.get(user_id).is_some_and(|r| r.online)
    }

    /// Number of users currently online.
    pub fn online_count(&self) -> usize {
        self.records.iter().filter(|r| r.online).count()
    }

    /// Add `user_id` to a room. Joining twice is a no-op.
    pub fn join_room(&self, room_id: &RoomId, user_id: UserId) -> bool {
        let joined = self.rooms.join(room_id, user_id);
        if joined {
            info!(room_id = %room_id, user_id = %user_id, "Joined room");
        }
        joined
    }

    /// Remove `user_id` from a room; the last leave deletes it.
    pub fn leave_room(&self, room_id: &RoomId, user_id: UserId) -> bool {
        let left = self.rooms.leave(room_id, user_id);
        if left {
            info!(room_id = %room_id, user_id = %user_id, "Left room");
        }
        left
    }

    /// Snapshot of a room's members.
    pub fn room_members(&self, room_id: &RoomId) -> Vec<UserId> {
        self.rooms.members(room_id)
    }

    /// Whether `user_id` belongs to `room_id`.
    pub fn is_room_member(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.rooms.is_member(room_id, user_id)
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    fn record_mut(
        &self,
        user_id: UserId,
    ) -> dashmap::mapref::one::RefMut<'_, UserId, PresenceRecord> {
        self.records
            .entry(user_id)
            .or_insert_with(|| PresenceRecord::new(user_id))
    }

    fn open(record: &mut PresenceRecord) -> Option<PresenceEvent> {
        record.active_connection_count += 1;
        if record.active_connection_count == 1 {
            record.online = true;
            record.version += 1;
            Some(PresenceEvent::from_record(record))
        } else {
            None
        }
    }

    fn emit(&self, event: Option<PresenceEvent>) -> bool {
        let Some(event) = event else {
            return false;
        };
        info!(user_id = %event.user_id, online = event.online, "Presence changed");
        // No receivers is fine.
        let _ = self.events.send(event);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use murmur_core::clock::ManualClock;

    use super::*;

    fn tracker() -> (Arc<ManualClock>, PresenceTracker) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        (clock.clone(), PresenceTracker::new(clock, 16))
    }

    fn assert_consistent(tracker: &PresenceTracker, user: &UserId) {
        let r = tracker.get(user);
        assert_eq!(r.online, r.active_connection_count > 0);
    }

    #[test]
    fn test_two_devices_one_close_stays_online() {
        let (_, tracker) = tracker();
        let user = UserId::new();

        assert!(tracker.on_connection_opened(user));
        assert!(!tracker.on_connection_opened(user));
        assert!(!tracker.on_connection_closed(user));

        let r = tracker.get(&user);
        assert!(r.online);
        assert_eq!(r.active_connection_count, 1);
        assert!(r.last_seen_at.is_none());
    }

    #[test]
    fn test_closing_all_sets_last_seen() {
        let (clock, tracker) = tracker();
        let user = UserId::new();
        tracker.on_connection_opened(user);
        tracker.on_connection_opened(user);
        clock.advance(Duration::minutes(5));
        tracker.on_connection_closed(user);
        assert!(tracker.on_connection_closed(user));

        let r = tracker.get(&user);
        assert!(!r.online);
        assert_eq!(r.last_seen_at, Some(clock.now()));
    }

    #[test]
    fn test_invariant_holds_across_sequences() {
        let (_, tracker) = tracker();
        let users: Vec<_> = (0..3).map(|_| UserId::new()).collect();
        let ops = [0, 1, 0, 2, 1, 0, 2, 1];
        let mut open = [0u32; 3];

        for (step, &u) in ops.iter().enumerate() {
            if step % 3 == 2 && open[u] > 0 {
                tracker.on_connection_closed(users[u]);
                open[u] -= 1;
            } else {
                tracker.on_connection_opened(users[u]);
                open[u] += 1;
            }
            for user in &users {
                assert_consistent(&tracker, user);
            }
        }
        for (u, count) in open.iter().enumerate() {
            for _ in 0..*count {
                tracker.on_connection_closed(users[u]);
            }
            assert!(!tracker.is_online(&users[u]));
        }
    }

    #[test]
    #[should_panic(expected = "presence count underflow")]
    fn test_close_without_open_panics() {
        let (_, tracker) = tracker();
        tracker.on_connection_closed(UserId::new());
    }

    #[test]
    fn test_connecting_is_not_online() {
        let (_, tracker) = tracker();
        let user = UserId::new();

        tracker.begin_connecting(user);
        assert!(!tracker.is_online(&user));
        assert_eq!(tracker.get(&user).connecting_count, 1);

        tracker.abort_connecting(user);
        assert_eq!(tracker.get(&user).connecting_count, 0);
        assert!(!tracker.is_online(&user));

        tracker.begin_connecting(user);
        assert!(tracker.promote_connecting(user));
        let r = tracker.get(&user);
        assert!(r.online);
        assert_eq!((r.connecting_count, r.active_connection_count), (0, 1));
    }

    #[tokio::test]
    async fn test_events_emitted_on_transitions_only() {
        let (_, tracker) = tracker();
        let mut rx = tracker.subscribe();
        let user = UserId::new();

        tracker.on_connection_opened(user);
        tracker.on_connection_opened(user);
        tracker.on_connection_closed(user);
        tracker.on_connection_closed(user);

        let first = rx.recv().await.unwrap();
        assert!(first.online && first.last_seen.is_none());
        let second = rx.recv().await.unwrap();
        assert!(!second.online && second.last_seen.is_some());
        assert!(second.version > first.version);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_version_bumps_on_flips_only() {
        let (_, tracker) = tracker();
        let user = UserId::new();

        tracker.on_connection_opened(user);
        tracker.on_connection_opened(user);
        assert_eq!(tracker.get(&user).version, 1);
        tracker.on_connection_closed(user);
        assert_eq!(tracker.get(&user).version, 1);
        tracker.on_connection_closed(user);
        assert_eq!(tracker.get(&user).version, 2);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].version, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_open_close_balances() {
        let (_, tracker) = tracker();
        let tracker = Arc::new(tracker);
        let user = UserId::new();

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    tracker.on_connection_opened(user);
                    tokio::task::yield_now().await;
                    tracker.on_connection_closed(user);
                })
            })
            .collect();
        for t in tasks {
            t.await.unwrap();
        }

        let r = tracker.get(&user);
        assert_eq!(r.active_connection_count, 0);
        assert!(!r.online);
    }

    #[test]
    fn test_unknown_user_is_offline() {
        let (_, tracker) = tracker();
        let r = tracker.get(&UserId::new());
        assert!(!r.online);
        assert_eq!(r.active_connection_count, 0);
    }
}
