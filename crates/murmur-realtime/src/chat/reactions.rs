//! Emoji reactions kept in memory per message.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use murmur_core::types::{MessageId, Principal};

use crate::message::types::ReactionEntry;

/// Reactions by message. A user holds at most one entry per emoji.
#[derive(Debug, Default)]
pub struct ReactionBook {
    reactions: DashMap<MessageId, Vec<ReactionEntry>>,
}

impl ReactionBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the reaction, or remove it if the user already reacted with
    /// the same emoji. Returns the message's reactions afterwards.
    pub fn toggle(
        &self,
        message_id: MessageId,
        reactor: &Principal,
        emoji: &str,
        now: DateTime<Utc>,
    ) -> Vec<ReactionEntry> {
        match self.reactions.entry(message_id) {
            Entry::Occupied(mut entry) => {
                let list = entry.get_mut();
                let before = list.len();
                list.retain(|r| !(r.user_id == reactor.user_id && r.emoji == emoji));
                if list.len() == before {
                    list.push(Self::entry(reactor, emoji, now));
                }
                if list.is_empty() {
                    entry.remove();
                    Vec::new()
                } else {
                    list.clone()
                }
            }
            Entry::Vacant(entry) => entry.insert(vec![Self::entry(reactor, emoji, now)]).clone(),
        }
    }

    /// Current reactions on a message.
    pub fn get(&self, message_id: &MessageId) -> Vec<ReactionEntry> {
        self.reactions
            .get(message_id)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    fn entry(reactor: &Principal, emoji: &str, now: DateTime<Utc>) -> ReactionEntry {
        ReactionEntry {
            user_id: reactor.user_id,
            user_name: reactor.display_name.clone(),
            emoji: emoji.to_string(),
            reacted_at: now,
        }
    }
}
