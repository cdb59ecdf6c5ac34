//! WebSocket message types for presence and realtime delivery
//!
//! This module defines the message protocol for client-server communication
//! over WebSocket connections. Messages are JSON text frames shaped as
//! `{"type": "...", "payload": ...}` with camelCase names.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller-supplied user identifier
pub type UserId = String;

/// Group identifier, also the name of the group's room
pub type GroupId = String;

// =============================================================================
// Client -> Server Messages
// =============================================================================

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Start or stop typing in a conversation
    Typing(TypingPayload),

    /// Subscribe this channel to a group's room
    JoinGroupRoom(RoomPayload),

    /// Unsubscribe this channel from a group's room
    LeaveGroupRoom(RoomPayload),

    /// Heartbeat to keep connection alive
    Ping,
}

// =============================================================================
// Server -> Client Messages
// =============================================================================

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Connection established successfully
    Connected(ConnectedPayload),

    /// Snapshot of every registered user id, sent on any registry change
    OnlineUserIds(Vec<UserId>),

    /// Who is typing in a conversation, as seen by the receiving user
    TypingUpdate(TypingUpdatePayload),

    /// Event produced by the application layer (new message, friend request...)
    ApplicationEvent(ApplicationEventPayload),

    /// Heartbeat response
    Pong {
        #[serde(rename = "serverTime")]
        server_time: i64,
    },
}

// =============================================================================
// Payload Types
// =============================================================================

/// Conversation flavour carried on typing signals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Direct,
    Group,
}

impl std::fmt::Display for ChatType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatType::Direct => write!(f, "direct"),
            ChatType::Group => write!(f, "group"),
        }
    }
}

/// A participant as shown in typing indicators
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserDescriptor {
    pub user_id: UserId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserDescriptor {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// Payload for Typing client message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPayload {
    pub conversation_id: String,
    pub chat_type: ChatType,
    pub is_typing: bool,
    pub user_descriptor: UserDescriptor,
}

/// Payload for JoinGroupRoom / LeaveGroupRoom
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPayload {
    pub group_id: GroupId,
}

/// Payload for Connected message
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub connection_id: Uuid,

    /// Registered user id, absent for anonymous channels
    pub user_id: Option<UserId>,
}

/// Payload for TypingUpdate message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypingUpdatePayload {
    /// Canonical conversation id
    pub conversation_id: String,
    pub chat_type: ChatType,

    /// Typing user ids, never including the receiver
    pub typing_users: Vec<UserId>,

    /// Display metadata for `typing_users`, same order
    pub typing_profiles: Vec<UserDescriptor>,
}

/// Payload for ApplicationEvent message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationEventPayload {
    pub event_name: String,
    pub payload: serde_json::Value,
}

impl ServerMessage {
    /// Wrap an application-level event
    pub fn application(event_name: impl Into<String>, payload: serde_json::Value) -> Self {
        ServerMessage::ApplicationEvent(ApplicationEventPayload {
            event_name: event_name.into(),
            payload,
        })
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Connected(_) => "connected",
            ServerMessage::OnlineUserIds(_) => "onlineUserIds",
            ServerMessage::TypingUpdate(_) => "typingUpdate",
            ServerMessage::ApplicationEvent(_) => "applicationEvent",
            ServerMessage::Pong { .. } => "pong",
        }
    }
}
