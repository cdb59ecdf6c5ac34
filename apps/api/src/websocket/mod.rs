//! Realtime presence and delivery
//!
//! This module handles:
//! - Connection registration and online presence
//! - Typing indicator aggregation per conversation
//! - Group room subscriptions
//! - Fan-out of application events to live channels

pub mod connection;
pub mod conversation;
pub mod dispatcher;
pub mod handler;
pub mod hub;
pub mod lifecycle;
pub mod messages;
pub mod rooms;
pub mod typing;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionRegistry, SendError};
pub use conversation::{ConversationIdError, ConversationTarget};
pub use dispatcher::Dispatcher;
pub use handler::ws_handler;
pub use hub::{Notifier, RealtimeError, RealtimeHub};
pub use lifecycle::{ConnectionState, DisconnectOutcome, Session};
pub use messages::{ChatType, ClientMessage, GroupId, ServerMessage, UserDescriptor, UserId};
pub use rooms::RoomMembership;
pub use typing::{TypingAggregator, TypingSnapshot};
