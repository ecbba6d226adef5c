//! Ephemeral room membership.

use std::collections::HashSet;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use murmur_core::types::{RoomId, UserId};

/// Room name → member set. A room exists only while it has members.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: DashMap<RoomId, HashSet<UserId>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user_id` to `room_id`. Returns `false` if already a member.
    pub fn join(&self, room_id: &RoomId, user_id: UserId) -> bool {
        self.rooms.entry(room_id.clone()).or_default().insert(user_id)
    }

    /// Remove `user_id` from `room_id`, deleting the room when it empties.
    /// Returns `false` if the user was not a member.
    pub fn leave(&self, room_id: &RoomId, user_id: UserId) -> bool {
        let Entry::Occupied(mut room) = self.rooms.entry(room_id.clone()) else {
            return false;
        };
        let removed = room.get_mut().remove(&user_id);
        if room.get().is_empty() {
            room.remove();
        }
        removed
    }

    /// Snapshot of the member set.
    pub fn members(&self, room_id: &RoomId) -> Vec<UserId> {
        self.rooms
            .get(room_id)
            .map(|m| m.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether `user_id` is in `room_id`.
    pub fn is_member(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|m| m.contains(user_id))
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let rooms = RoomRegistry::new();
        let room = RoomId::from("r1");
        let user = UserId::new();

        assert!(rooms.join(&room, user));
        assert!(!rooms.join(&room, user));
        assert_eq!(rooms.members(&room), vec![user]);
    }

    #[test]
    fn test_last_leave_deletes_room() {
        let rooms = RoomRegistry::new();
        let room = RoomId::from("r1");
        let (a, b) = (UserId::new(), UserId::new());
        rooms.join(&room, a);
        rooms.join(&room, b);

        assert!(rooms.leave(&room, a));
        assert_eq!(rooms.room_count(), 1);
        assert!(rooms.leave(&room, b));
        assert_eq!(rooms.room_count(), 0);
        assert!(!rooms.leave(&room, b));
    }

    #[test]
    fn test_leave_unknown_room_creates_nothing() {
        let rooms = RoomRegistry::new();
        assert!(!rooms.leave(&RoomId::from("ghost"), UserId::new()));
        assert_eq!(rooms.room_count(), 0);
    }
}
