//! Chat message entities.

pub mod model;
pub mod status;

pub use model::ChatMessage;
pub use status::MessageStatus;
