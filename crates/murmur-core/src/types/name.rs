//! String-keyed identifiers.
//!
//! Rooms, topics, and chats are named by clients rather than minted by the
//! server, so they wrap a `String` instead of a `Uuid`.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_name {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw name.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw name.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name!(
    /// Name of an ephemeral, in-memory room.
    RoomId
);

define_name!(
    /// Name of a broadcast topic (`presence`, `group:{id}`, `channel:{id}`, ...).
    TopicId
);

define_name!(
    /// A conversation a notification originates from (a peer user, group, or channel).
    ChatId
);

impl TopicId {
    /// Topic carrying presence change events.
    pub fn presence() -> Self {
        Self::new("presence")
    }

    /// Topic mirroring a room's traffic.
    pub fn room(room_id: &RoomId) -> Self {
        Self(format!("room:{room_id}"))
    }

    /// Per-user topic.
    pub fn user(user_id: &crate::types::UserId) -> Self {
        Self(format!("user:{user_id}"))
    }
}
