//! # murmur-realtime
//!
//! Real-time engine for Murmur. Provides:
//!
//! - Connection authentication with a `Pending -> Authenticated | Rejected` handshake
//! - Connection lifecycle with scoped cleanup guards
//! - Reference-counted user presence and ephemeral room membership
//! - Topic subscriptions for group/channel broadcast
//! - A message router with per-target send timeouts and delivery reports
//! - Notification gating (mute lists, per-type toggles, do-not-disturb) and dispatch

pub mod chat;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod presence;
pub mod router;
pub mod server;
pub mod topic;

pub use connection::authenticator::{ConnectionAuthenticator, HandshakeState};
pub use connection::manager::{ConnectionGuard, ConnectionManager};
pub use notification::dispatcher::NotificationDispatcher;
pub use notification::gate::NotificationGate;
pub use presence::tracker::PresenceTracker;
pub use router::{DeliveryReport, Destination, MessageRouter};
pub use server::{EngineStores, RealtimeEngine};
pub use topic::registry::TopicRegistry;
