//! Event fan-out
//!
//! Resolves recipients through the registry or a room and enqueues the
//! message on each live channel. Nothing here awaits: pushes land on the
//! channel's outbound queue and the socket's writer task does the I/O.
//! An offline target, an empty room, or a closed channel is a silent drop.

use super::connection::{ConnectionHandle, ConnectionRegistry};
use super::conversation::ConversationTarget;
use super::messages::ServerMessage;
use super::rooms::RoomMembership;
use super::typing::TypingSnapshot;

/// Pushes server messages to users, rooms, or everyone
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: ConnectionRegistry,
    rooms: RoomMembership,
}

impl Dispatcher {
    pub fn new(registry: ConnectionRegistry, rooms: RoomMembership) -> Self {
        Self { registry, rooms }
    }

    /// Push to the user's registered channel
    ///
    /// Returns whether a push was enqueued. Offline users are not an error.
    pub fn emit(&self, user_id: &str, msg: ServerMessage) -> bool {
        match self.registry.lookup(user_id) {
            Some(handle) => deliver(&handle, msg),
            None => {
                tracing::trace!(user_id = %user_id, kind = msg.kind(), "Target offline, dropping");
                false
            }
        }
    }

    /// Push the same message to every channel in a room
    pub fn emit_to_room(&self, group_id: &str, msg: ServerMessage) -> usize {
        self.emit_to_room_with(group_id, |_| Some(msg.clone()))
    }

    /// Push a per-channel message to every channel in a room
    ///
    /// `build` may return `None` to skip a channel.
    pub fn emit_to_room_with<F>(&self, group_id: &str, mut build: F) -> usize
    where
        F: FnMut(&ConnectionHandle) -> Option<ServerMessage>,
    {
        let mut sent = 0;

        for connection_id in self.rooms.members(group_id) {
            // A member that already detached is skipped
            let Some(handle) = self.registry.connection(connection_id) else {
                continue;
            };
            if let Some(msg) = build(&handle) {
                if deliver(&handle, msg) {
                    sent += 1;
                }
            }
        }

        sent
    }

    /// Push to every live channel, anonymous ones included
    pub fn broadcast(&self, msg: ServerMessage) -> usize {
        let mut sent = 0;
        for handle in self.registry.all_connections() {
            if deliver(&handle, msg.clone()) {
                sent += 1;
            }
        }
        sent
    }

    /// Broadcast the current online roster
    pub fn broadcast_online_users(&self) -> usize {
        let online = self.registry.online_user_ids();
        let online_count = online.len();
        let sent = self.broadcast(ServerMessage::OnlineUserIds(online));

        tracing::debug!(online = online_count, recipients = sent, "Presence broadcast");
        sent
    }

    /// Send each recipient of a conversation its own view of who is typing
    pub fn dispatch_typing(&self, snapshot: &TypingSnapshot) -> usize {
        match &snapshot.target {
            ConversationTarget::Direct { participants } => {
                let mut sent = 0;
                for participant in participants {
                    let view = snapshot.view_for(Some(participant.as_str()));
                    if self.emit(participant, ServerMessage::TypingUpdate(view)) {
                        sent += 1;
                    }
                }
                sent
            }
            ConversationTarget::Group { group_id } => self.emit_to_room_with(group_id, |handle| {
                Some(ServerMessage::TypingUpdate(
                    snapshot.view_for(handle.user_id()),
                ))
            }),
        }
    }
}

fn deliver(handle: &ConnectionHandle, msg: ServerMessage) -> bool {
    let kind = msg.kind();
    match handle.send(msg) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(
                connection_id = %handle.id(),
                user_id = handle.user_id().unwrap_or("-"),
                kind,
                error = %e,
                "Push dropped"
            );
            false
        }
    }
}
