//! Notification domain entities.

pub mod kind;
pub mod model;
pub mod settings;

pub use kind::NotificationType;
pub use model::Notification;
pub use settings::NotificationSettings;
