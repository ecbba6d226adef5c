//! User presence and ephemeral room membership.

pub mod forwarder;
pub mod record;
pub mod rooms;
pub mod tracker;

pub use forwarder::PresenceForwarder;
pub use record::{PresenceEvent, PresenceRecord};
pub use rooms::RoomRegistry;
pub use tracker::PresenceTracker;
