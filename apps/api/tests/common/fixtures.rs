//! Client signal fixtures

#![allow(dead_code)]

use parley_api::websocket::messages::{RoomPayload, TypingPayload};
use parley_api::websocket::{ChatType, ClientMessage, UserDescriptor};

pub fn descriptor(user_id: &str) -> UserDescriptor {
    UserDescriptor::new(user_id).with_display_name(format!("User {}", user_id))
}

pub fn typing(user_id: &str, conversation_id: &str, chat_type: ChatType, is_typing: bool) -> ClientMessage {
    ClientMessage::Typing(TypingPayload {
        conversation_id: conversation_id.to_string(),
        chat_type,
        is_typing,
        user_descriptor: descriptor(user_id),
    })
}

pub fn direct_typing(user_id: &str, conversation_id: &str, is_typing: bool) -> ClientMessage {
    typing(user_id, conversation_id, ChatType::Direct, is_typing)
}

pub fn group_typing(user_id: &str, group_id: &str, is_typing: bool) -> ClientMessage {
    typing(user_id, group_id, ChatType::Group, is_typing)
}

pub fn join(group_id: &str) -> ClientMessage {
    ClientMessage::JoinGroupRoom(RoomPayload {
        group_id: group_id.to_string(),
    })
}

pub fn leave(group_id: &str) -> ClientMessage {
    ClientMessage::LeaveGroupRoom(RoomPayload {
        group_id: group_id.to_string(),
    })
}

/// A client message as it travels over the socket
pub fn frame(message: &ClientMessage) -> String {
    serde_json::to_string(message).expect("client message serializes")
}
