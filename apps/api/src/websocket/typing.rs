//! Typing indicator aggregation
//!
//! Each conversation keeps the ordered list of participants currently
//! typing. A participant is added on a start signal and removed on a stop
//! signal or when their connection goes away. Conversations with nobody
//! typing are removed from the map immediately.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use super::conversation::ConversationTarget;
use super::messages::{TypingUpdatePayload, UserDescriptor, UserId};

#[derive(Debug, Clone)]
struct Typist {
    descriptor: UserDescriptor,
    started_at: Instant,
}

/// Typing state of one conversation after a change, ready for dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingSnapshot {
    pub target: ConversationTarget,
    pub typists: Vec<UserDescriptor>,
}

impl TypingSnapshot {
    fn capture(target: &ConversationTarget, typists: &[Typist]) -> Self {
        Self {
            target: target.clone(),
            typists: typists.iter().map(|t| t.descriptor.clone()).collect(),
        }
    }

    /// The update as seen by `recipient`, who never sees themselves
    pub fn view_for(&self, recipient: Option<&str>) -> TypingUpdatePayload {
        let visible: Vec<&UserDescriptor> = self
            .typists
            .iter()
            .filter(|d| Some(d.user_id.as_str()) != recipient)
            .collect();

        TypingUpdatePayload {
            conversation_id: self.target.conversation_id(),
            chat_type: self.target.chat_type(),
            typing_users: visible.iter().map(|d| d.user_id.clone()).collect(),
            typing_profiles: visible.into_iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.typists.is_empty()
    }
}

/// Per-conversation sets of typing participants
#[derive(Debug, Clone, Default)]
pub struct TypingAggregator {
    conversations: Arc<DashMap<ConversationTarget, Vec<Typist>>>,
}

impl TypingAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a start or stop signal and return the resulting state
    ///
    /// Starting twice keeps a single entry (its descriptor and start time are
    /// refreshed). Stopping a user who is not typing changes nothing. Either
    /// way the returned snapshot should be dispatched.
    pub fn set_typing(
        &self,
        target: &ConversationTarget,
        descriptor: UserDescriptor,
        is_typing: bool,
    ) -> TypingSnapshot {
        if is_typing {
            let mut typists = self.conversations.entry(target.clone()).or_default();
            match typists
                .iter_mut()
                .find(|t| t.descriptor.user_id == descriptor.user_id)
            {
                Some(existing) => {
                    existing.descriptor = descriptor;
                    existing.started_at = Instant::now();
                }
                None => typists.push(Typist {
                    descriptor,
                    started_at: Instant::now(),
                }),
            }
            return TypingSnapshot::capture(target, &typists);
        }

        let snapshot = match self.conversations.get_mut(target) {
            Some(mut typists) => {
                typists.retain(|t| t.descriptor.user_id != descriptor.user_id);
                TypingSnapshot::capture(target, &typists)
            }
            None => TypingSnapshot::capture(target, &[]),
        };

        // The guard above must be released before touching the same shard again
        self.conversations
            .remove_if(target, |_, typists| typists.is_empty());

        snapshot
    }

    /// Drop `user_id` from every conversation
    ///
    /// Returns one snapshot per conversation the user was typing in.
    pub fn remove_user_everywhere(&self, user_id: &str) -> Vec<TypingSnapshot> {
        self.remove_matching(|t| t.descriptor.user_id == user_id)
    }

    /// Drop every typist whose last start signal is older than `max_idle`
    pub fn expire_idle(&self, max_idle: Duration) -> Vec<TypingSnapshot> {
        let now = Instant::now();
        self.remove_matching(|t| now.saturating_duration_since(t.started_at) >= max_idle)
    }

    fn remove_matching<F>(&self, should_remove: F) -> Vec<TypingSnapshot>
    where
        F: Fn(&Typist) -> bool,
    {
        let mut affected = Vec::new();

        for mut entry in self.conversations.iter_mut() {
            let before = entry.value().len();
            entry.value_mut().retain(|t| !should_remove(t));
            if entry.value().len() != before {
                affected.push(TypingSnapshot::capture(entry.key(), entry.value()));
            }
        }

        self.conversations.retain(|_, typists| !typists.is_empty());

        affected
    }

    /// User ids currently typing in a conversation, in start order
    pub fn typing_users(&self, target: &ConversationTarget) -> Vec<UserId> {
        self.conversations
            .get(target)
            .map(|typists| {
                typists
                    .iter()
                    .map(|t| t.descriptor.user_id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the conversation has an entry at all
    pub fn contains(&self, target: &ConversationTarget) -> bool {
        self.conversations.contains_key(target)
    }

    /// Number of conversations with at least one typist
    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}
