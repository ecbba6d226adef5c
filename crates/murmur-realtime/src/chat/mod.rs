//! Chat operations triggered by inbound frames.

pub mod reactions;
pub mod service;

pub use reactions::ReactionBook;
pub use service::{ChatService, ConversationSummary};
