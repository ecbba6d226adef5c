//! Topic subscriptions for group and channel broadcast.

pub mod access;
pub mod registry;
pub mod subscription;

pub use access::may_subscribe;
pub use registry::TopicRegistry;
pub use subscription::{SubscribeOutcome, SubscriptionTracker};
