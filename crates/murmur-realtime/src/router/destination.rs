//! Routing destinations.

use std::fmt;

use serde::{Deserialize, Serialize};

use murmur_core::types::{RoomId, TopicId, UserId};

/// Where a routed message goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Destination {
    /// Every connection bound to this user.
    ToUser(UserId),
    /// Every connection of every current room member.
    ToRoom(RoomId),
    /// Every connection subscribed to the topic.
    ToTopic(TopicId),
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToUser(id) => write!(f, "user:{id}"),
            Self::ToRoom(id) => write!(f, "room:{id}"),
            Self::ToTopic(id) => write!(f, "topic:{id}"),
        }
    }
}
