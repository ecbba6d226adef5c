//! Notification gating, settings, and delivery.

pub mod dispatcher;
pub mod gate;
pub mod settings;

pub use dispatcher::NotificationDispatcher;
pub use gate::{NotificationGate, in_dnd_window};
pub use settings::NotificationSettingsService;
