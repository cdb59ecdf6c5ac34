//! Conversation identifiers
//!
//! A direct conversation is keyed by its two participants in sorted order,
//! written `direct:<a>-<b>`. A group conversation is keyed by the group id.

use super::messages::{ChatType, GroupId, UserId};

/// Longest accepted user or group id
pub const MAX_ID_LENGTH: usize = 128;

const DIRECT_PREFIX: &str = "direct:";
const GROUP_PREFIX: &str = "group:";

/// Validate a user or group identifier
///
/// Ids are 1-128 characters of ASCII letters, digits, `-` and `_`.
pub fn validate_identifier(id: &str) -> Result<(), &'static str> {
    if id.is_empty() {
        return Err("id cannot be empty");
    }
    if id.len() > MAX_ID_LENGTH {
        return Err("id must be at most 128 characters");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("id contains invalid characters");
    }
    Ok(())
}

/// Reasons a conversation id fails to decompose
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationIdError {
    #[error("conversation id is empty")]
    Empty,

    #[error("{user_id} is not a participant of {conversation_id}")]
    NotAParticipant {
        conversation_id: String,
        user_id: UserId,
    },

    #[error("direct conversation with oneself: {0}")]
    SelfConversation(String),

    #[error("invalid participant id '{id}': {reason}")]
    InvalidParticipant { id: String, reason: &'static str },

    #[error("invalid group id '{id}': {reason}")]
    InvalidGroup { id: String, reason: &'static str },
}

/// Who a conversation's typing updates go to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConversationTarget {
    /// Both participants, sorted
    Direct { participants: [UserId; 2] },

    /// Everyone subscribed to the group's room
    Group { group_id: GroupId },
}

impl ConversationTarget {
    /// Direct conversation between two distinct users, in canonical order
    pub fn direct(a: &str, b: &str) -> Result<Self, ConversationIdError> {
        for id in [a, b] {
            validate_identifier(id).map_err(|reason| ConversationIdError::InvalidParticipant {
                id: id.to_string(),
                reason,
            })?;
        }
        if a == b {
            return Err(ConversationIdError::SelfConversation(a.to_string()));
        }

        let mut participants = [a.to_string(), b.to_string()];
        participants.sort();
        Ok(ConversationTarget::Direct { participants })
    }

    /// Group conversation, accepting an optional `group:` prefix
    pub fn group(raw: &str) -> Result<Self, ConversationIdError> {
        let group_id = raw.strip_prefix(GROUP_PREFIX).unwrap_or(raw);
        validate_identifier(group_id).map_err(|reason| ConversationIdError::InvalidGroup {
            id: group_id.to_string(),
            reason,
        })?;

        Ok(ConversationTarget::Group {
            group_id: group_id.to_string(),
        })
    }

    /// Parse a conversation id sent by `sender`
    ///
    /// Direct ids are split around the sender's own id, so participant ids
    /// containing `-` are still unambiguous. Either participant order is
    /// accepted; the result is always canonical.
    pub fn parse(raw: &str, chat_type: ChatType, sender: &str) -> Result<Self, ConversationIdError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConversationIdError::Empty);
        }

        match chat_type {
            ChatType::Group => Self::group(raw),
            ChatType::Direct => {
                let body = raw.strip_prefix(DIRECT_PREFIX).unwrap_or(raw);
                let peer = body
                    .strip_prefix(sender)
                    .and_then(|rest| rest.strip_prefix('-'))
                    .or_else(|| {
                        body.strip_suffix(sender)
                            .and_then(|rest| rest.strip_suffix('-'))
                    })
                    .ok_or_else(|| ConversationIdError::NotAParticipant {
                        conversation_id: raw.to_string(),
                        user_id: sender.to_string(),
                    })?;

                Self::direct(sender, peer)
            }
        }
    }

    pub fn chat_type(&self) -> ChatType {
        match self {
            ConversationTarget::Direct { .. } => ChatType::Direct,
            ConversationTarget::Group { .. } => ChatType::Group,
        }
    }

    /// Canonical id echoed back to clients
    pub fn conversation_id(&self) -> String {
        match self {
            ConversationTarget::Direct { participants: [a, b] } => {
                format!("{}{}-{}", DIRECT_PREFIX, a, b)
            }
            ConversationTarget::Group { group_id } => group_id.clone(),
        }
    }
}

impl std::fmt::Display for ConversationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.conversation_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("direct:u1-u2", "u1")]
    #[case("direct:u1-u2", "u2")]
    #[case("direct:u2-u1", "u1")]
    #[case("u1-u2", "u2")]
    fn test_direct_ids_are_canonical(#[case] raw: &str, #[case] sender: &str) {
        let target = ConversationTarget::parse(raw, ChatType::Direct, sender).unwrap();
        assert_eq!(
            target,
            ConversationTarget::Direct {
                participants: ["u1".to_string(), "u2".to_string()]
            }
        );
        assert_eq!(target.conversation_id(), "direct:u1-u2");
        assert_eq!(target.chat_type(), ChatType::Direct);
    }

    #[test]
    fn test_direct_ids_with_uuid_participants() {
        let a = "0b6c5a8e-1f2d-4c3b-9a8e-7d6c5b4a3f21";
        let b = "f3e2d1c0-b9a8-4f7e-8d6c-5b4a39281706";
        let raw = format!("direct:{}-{}", a, b);

        let from_a = ConversationTarget::parse(&raw, ChatType::Direct, a).unwrap();
        let from_b = ConversationTarget::parse(&raw, ChatType::Direct, b).unwrap();

        assert_eq!(from_a, from_b);
        assert_eq!(from_a.conversation_id(), raw);
    }

    #[test]
    fn test_prefix_overlap_between_participants() {
        let target = ConversationTarget::parse("direct:u1-u10", ChatType::Direct, "u1").unwrap();
        assert_eq!(target.conversation_id(), "direct:u1-u10");

        let target = ConversationTarget::parse("direct:u10-u1", ChatType::Direct, "u1").unwrap();
        assert_eq!(target.conversation_id(), "direct:u1-u10");
    }

    #[test]
    fn test_direct_id_without_sender_is_rejected() {
        let err = ConversationTarget::parse("direct:u2-u3", ChatType::Direct, "u1").unwrap_err();
        assert!(matches!(err, ConversationIdError::NotAParticipant { .. }));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn test_empty_id_is_rejected(#[case] raw: &str) {
        assert_eq!(
            ConversationTarget::parse(raw, ChatType::Direct, "u1"),
            Err(ConversationIdError::Empty)
        );
    }

    #[test]
    fn test_self_conversation_is_rejected() {
        let err = ConversationTarget::parse("direct:u1-u1", ChatType::Direct, "u1").unwrap_err();
        assert_eq!(err, ConversationIdError::SelfConversation("u1".to_string()));
    }

    #[test]
    fn test_missing_peer_is_rejected() {
        let err = ConversationTarget::parse("direct:u1-", ChatType::Direct, "u1").unwrap_err();
        assert!(matches!(err, ConversationIdError::InvalidParticipant { .. }));
    }

    #[rstest]
    #[case("g1", "g1")]
    #[case("group:g1", "g1")]
    #[case("team_rocket-2", "team_rocket-2")]
    fn test_group_ids(#[case] raw: &str, #[case] expected: &str) {
        let target = ConversationTarget::parse(raw, ChatType::Group, "u1").unwrap();
        assert_eq!(
            target,
            ConversationTarget::Group {
                group_id: expected.to_string()
            }
        );
        assert_eq!(target.conversation_id(), expected);
        assert_eq!(target.chat_type(), ChatType::Group);
    }

    #[test]
    fn test_invalid_group_id_is_rejected() {
        let err = ConversationTarget::parse("group:", ChatType::Group, "u1").unwrap_err();
        assert!(matches!(err, ConversationIdError::InvalidGroup { .. }));

        let err = ConversationTarget::parse("g 1", ChatType::Group, "u1").unwrap_err();
        assert!(matches!(err, ConversationIdError::InvalidGroup { .. }));
    }

    #[test]
    fn test_validate_identifier_valid() {
        assert!(validate_identifier("u1").is_ok());
        assert!(validate_identifier("user_123").is_ok());
        assert!(validate_identifier("0b6c5a8e-1f2d-4c3b-9a8e-7d6c5b4a3f21").is_ok());
        assert!(validate_identifier(&"a".repeat(MAX_ID_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_identifier_invalid() {
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier(&"a".repeat(MAX_ID_LENGTH + 1)).is_err());
        assert!(validate_identifier("user<script>").is_err());
        assert!(validate_identifier("user/path").is_err());
        assert!(validate_identifier("with spaces").is_err());
        assert!(validate_identifier("dotted.name").is_err());
        assert!(validate_identifier("ünïcode").is_err());
    }
}
