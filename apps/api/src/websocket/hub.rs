//! Realtime hub
//!
//! `RealtimeHub` owns the registry, typing state and rooms for the whole
//! process. It is created once at startup and handed to the router, so
//! tests and alternative transports can build their own instance.

use parley_shared_config::RealtimeConfig;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::connection::{ConnectionHandle, ConnectionRegistry};
use super::conversation::{validate_identifier, ConversationIdError, ConversationTarget};
use super::dispatcher::Dispatcher;
use super::messages::{ClientMessage, ServerMessage, TypingPayload};
use super::rooms::RoomMembership;
use super::typing::TypingAggregator;

/// What application code needs from the realtime layer
///
/// Every call is fire-and-forget: offline targets and empty rooms are
/// silently skipped and nothing is queued for later.
pub trait Notifier: Send + Sync {
    /// Push a named event to one user's live channel
    fn emit(&self, user_id: &str, event_name: &str, payload: serde_json::Value) -> bool;

    /// Push a named event to every channel subscribed to a group's room
    fn emit_to_room(&self, group_id: &str, event_name: &str, payload: serde_json::Value) -> usize;

    /// Whether the user currently has a registered channel
    fn is_online(&self, user_id: &str) -> bool;
}

/// Signals that are dropped instead of applied
#[derive(Debug, thiserror::Error)]
pub enum RealtimeError {
    #[error("invalid conversation id: {0}")]
    Conversation(#[from] ConversationIdError),

    #[error("typing signal from an anonymous connection")]
    AnonymousTyping,

    #[error("typing signal for {claimed} on a connection registered as {actual}")]
    IdentityMismatch { claimed: String, actual: String },

    #[error("typing signal for {user_id} on a connection that is no longer registered")]
    DisplacedConnection { user_id: String },

    #[error("invalid group id '{id}': {reason}")]
    InvalidGroupId { id: String, reason: &'static str },
}

/// Process-wide presence, typing and room state
#[derive(Debug, Clone)]
pub struct RealtimeHub {
    registry: ConnectionRegistry,
    typing: TypingAggregator,
    rooms: RoomMembership,
    dispatcher: Dispatcher,
    config: RealtimeConfig,
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(RealtimeConfig::default())
    }
}

impl RealtimeHub {
    pub fn new(config: RealtimeConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let rooms = RoomMembership::new();
        let dispatcher = Dispatcher::new(registry.clone(), rooms.clone());

        Self {
            registry,
            typing: TypingAggregator::new(),
            rooms,
            dispatcher,
            config,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn typing(&self) -> &TypingAggregator {
        &self.typing
    }

    pub fn rooms(&self) -> &RoomMembership {
        &self.rooms
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Parse and apply one text frame, logging and dropping anything malformed
    pub fn handle_frame(&self, handle: &ConnectionHandle, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    connection_id = %handle.id(),
                    "Dropping unparseable client message"
                );
                return;
            }
        };

        if let Err(e) = self.handle_client_message(handle, message) {
            tracing::warn!(
                error = %e,
                connection_id = %handle.id(),
                user_id = handle.user_id().unwrap_or("-"),
                "Dropping malformed client signal"
            );
        }
    }

    /// Apply a parsed client message on behalf of `handle`
    pub fn handle_client_message(
        &self,
        handle: &ConnectionHandle,
        message: ClientMessage,
    ) -> Result<(), RealtimeError> {
        match message {
            ClientMessage::Typing(payload) => self.handle_typing(handle, payload),
            ClientMessage::JoinGroupRoom(room) => {
                validate_group(&room.group_id)?;
                if self.rooms.join(handle.id(), &room.group_id) {
                    tracing::debug!(
                        connection_id = %handle.id(),
                        group_id = %room.group_id,
                        "Joined group room"
                    );
                }
                Ok(())
            }
            ClientMessage::LeaveGroupRoom(room) => {
                validate_group(&room.group_id)?;
                if self.rooms.leave(handle.id(), &room.group_id) {
                    tracing::debug!(
                        connection_id = %handle.id(),
                        group_id = %room.group_id,
                        "Left group room"
                    );
                }
                Ok(())
            }
            ClientMessage::Ping => {
                let server_time = chrono::Utc::now().timestamp_millis();
                // A closed channel here just means the socket is going away
                let _ = handle.send(ServerMessage::Pong { server_time });
                Ok(())
            }
        }
    }

    /// Apply a typing signal and push every recipient its own view
    fn handle_typing(
        &self,
        handle: &ConnectionHandle,
        payload: TypingPayload,
    ) -> Result<(), RealtimeError> {
        let actual = handle.user_id().ok_or(RealtimeError::AnonymousTyping)?;
        let claimed = payload.user_descriptor.user_id.as_str();
        if claimed != actual {
            return Err(RealtimeError::IdentityMismatch {
                claimed: claimed.to_string(),
                actual: actual.to_string(),
            });
        }

        let registered = self
            .registry
            .lookup(actual)
            .map_or(false, |current| current.same_channel(handle));
        if !registered {
            return Err(RealtimeError::DisplacedConnection {
                user_id: actual.to_string(),
            });
        }

        let target = ConversationTarget::parse(&payload.conversation_id, payload.chat_type, actual)?;
        let snapshot = self
            .typing
            .set_typing(&target, payload.user_descriptor, payload.is_typing);
        let recipients = self.dispatcher.dispatch_typing(&snapshot);

        tracing::trace!(
            conversation_id = %target,
            user_id = %actual,
            is_typing = payload.is_typing,
            typing = snapshot.typists.len(),
            recipients,
            "Typing update dispatched"
        );

        Ok(())
    }

    /// Clear typing indicators older than `max_idle` and re-dispatch
    ///
    /// Returns the number of conversations that changed.
    pub fn expire_idle_typing(&self, max_idle: Duration) -> usize {
        let expired = self.typing.expire_idle(max_idle);
        for snapshot in &expired {
            self.dispatcher.dispatch_typing(snapshot);
        }

        if !expired.is_empty() {
            tracing::debug!(conversations = expired.len(), "Expired idle typing indicators");
        }
        expired.len()
    }

    /// Start the background typing sweeper if an idle timeout is configured
    pub fn spawn_typing_sweeper(&self) -> Option<JoinHandle<()>> {
        let max_idle = self.config.typing_idle_timeout?;
        let period = self.config.typing_sweep_interval;
        let hub = self.clone();

        tracing::info!(
            idle_timeout_secs = max_idle.as_secs(),
            sweep_interval_secs = period.as_secs(),
            "Typing idle expiry enabled"
        );

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                hub.expire_idle_typing(max_idle);
            }
        }))
    }
}

impl Notifier for RealtimeHub {
    fn emit(&self, user_id: &str, event_name: &str, payload: serde_json::Value) -> bool {
        self.dispatcher
            .emit(user_id, ServerMessage::application(event_name, payload))
    }

    fn emit_to_room(&self, group_id: &str, event_name: &str, payload: serde_json::Value) -> usize {
        self.dispatcher
            .emit_to_room(group_id, ServerMessage::application(event_name, payload))
    }

    fn is_online(&self, user_id: &str) -> bool {
        self.registry.is_online(user_id)
    }
}

fn validate_group(group_id: &str) -> Result<(), RealtimeError> {
    validate_identifier(group_id).map_err(|reason| RealtimeError::InvalidGroupId {
        id: group_id.to_string(),
        reason,
    })
}
