//! Who may subscribe to which topic.

use murmur_core::types::{Principal, TopicId};

/// Topic prefixes open to anonymous connections.
const PUBLIC_PREFIXES: &[&str] = &["channel:"];

/// Topic prefixes open to any authenticated connection.
const MEMBER_PREFIXES: &[&str] = &["group:", "room:"];

/// Whether a connection bound to `principal` may subscribe to `topic`.
///
/// `presence` and `channel:*` are public. Authenticated connections may
/// also join `group:*`, `room:*`, and their own `user:{id}` topic.
pub fn may_subscribe(principal: Option<&Principal>, topic: &TopicId) -> bool {
    let name = topic.as_str();
    if name == TopicId::presence().as_str() || has_prefix(name, PUBLIC_PREFIXES) {
        return true;
    }

    let Some(principal) = principal else {
        return false;
    };

    has_prefix(name, MEMBER_PREFIXES) || name == TopicId::user(&principal.user_id).as_str()
}

/// Whether `topic` accepts published messages.
pub fn is_broadcast_topic(topic: &TopicId) -> bool {
    let name = topic.as_str();
    name.starts_with("group:") || name.starts_with("channel:")
}

fn has_prefix(name: &str, prefixes: &[&str]) -> bool {
    prefixes
        .iter()
        .any(|p| name.starts_with(p) && name.len() > p.len())
}
