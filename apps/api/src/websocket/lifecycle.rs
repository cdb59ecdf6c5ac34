//! Connection lifecycle
//!
//! `connect` and `disconnect` keep the registry, rooms and typing state
//! consistent with the set of open sockets. `Session` ties the two together
//! so a socket task that ends for any reason still runs its cleanup.

use tokio::sync::mpsc;

use super::connection::ConnectionHandle;
use super::hub::RealtimeHub;
use super::messages::{ConnectedPayload, GroupId, ServerMessage, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    /// Terminal
    Disconnected,
}

/// What a disconnect cleaned up
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisconnectOutcome {
    /// Rooms the channel was removed from
    pub rooms_left: Vec<GroupId>,

    /// Whether the channel was still the registered one for its user
    pub unregistered: bool,

    /// Conversations whose typing state changed
    pub typing_conversations: usize,
}

impl RealtimeHub {
    /// Accept a new channel
    ///
    /// The `connected` acknowledgement is queued before anything else, so it
    /// is always the first frame the client sees.
    pub fn connect(
        &self,
        user_id: Option<UserId>,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> ConnectionHandle {
        let handle = ConnectionHandle::new(user_id, sender);

        let _ = handle.send(ServerMessage::Connected(ConnectedPayload {
            connection_id: handle.id(),
            user_id: handle.user_id().map(String::from),
        }));

        self.registry().attach(handle.clone());

        match handle.user_id() {
            Some(user_id) => {
                self.registry().register(user_id, handle.clone());
                self.dispatcher().broadcast_online_users();
            }
            None => {
                // The roster did not change, but the new observer still needs it
                let _ = handle.send(ServerMessage::OnlineUserIds(
                    self.registry().online_user_ids(),
                ));
            }
        }

        tracing::info!(
            connection_id = %handle.id(),
            user_id = handle.user_id().unwrap_or("-"),
            connections = self.registry().connection_count(),
            "Connection opened"
        );

        handle
    }

    /// Release everything held for a closing channel
    ///
    /// Each step runs regardless of the others. A channel that was displaced
    /// by a newer connect for the same user leaves that user's presence and
    /// typing state untouched while the newer channel is still registered.
    pub fn disconnect(&self, handle: &ConnectionHandle) -> DisconnectOutcome {
        let mut outcome = DisconnectOutcome {
            rooms_left: self.rooms().leave_all(handle.id()),
            ..Default::default()
        };

        if let Some(user_id) = handle.user_id() {
            outcome.unregistered = self.registry().unregister_connection(user_id, handle.id());

            if outcome.unregistered || !self.registry().is_online(user_id) {
                let affected = self.typing().remove_user_everywhere(user_id);
                for snapshot in &affected {
                    self.dispatcher().dispatch_typing(snapshot);
                }
                outcome.typing_conversations = affected.len();
            } else {
                tracing::debug!(
                    user_id = %user_id,
                    connection_id = %handle.id(),
                    "Displaced connection closed, keeping newer registration"
                );
            }
        }

        self.registry().detach(handle.id());

        if outcome.unregistered {
            self.dispatcher().broadcast_online_users();
        }

        tracing::info!(
            connection_id = %handle.id(),
            user_id = handle.user_id().unwrap_or("-"),
            rooms_left = outcome.rooms_left.len(),
            typing_cleared = outcome.typing_conversations,
            connected_ms = chrono::Utc::now().timestamp_millis() - handle.connected_at(),
            "Connection closed"
        );

        outcome
    }
}

/// One accepted socket from connect to disconnect
///
/// Dropping a connected session disconnects it if `close` was not called.
#[derive(Debug)]
pub struct Session {
    hub: RealtimeHub,
    handle: Option<ConnectionHandle>,
    state: ConnectionState,
}

impl Session {
    pub fn new(hub: RealtimeHub) -> Self {
        Self {
            hub,
            handle: None,
            state: ConnectionState::Connecting,
        }
    }

    /// Register the channel with the hub
    ///
    /// Only the first call connects; later calls return the existing handle.
    pub fn connect(
        &mut self,
        user_id: Option<UserId>,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> &ConnectionHandle {
        let hub = &self.hub;
        let state = &mut self.state;
        self.handle.get_or_insert_with(|| {
            *state = ConnectionState::Connected;
            hub.connect(user_id, sender)
        })
    }

    pub fn handle(&self) -> Option<&ConnectionHandle> {
        self.handle.as_ref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Apply one inbound text frame
    pub fn handle_frame(&self, text: &str) {
        if let (ConnectionState::Connected, Some(handle)) = (self.state, &self.handle) {
            self.hub.handle_frame(handle, text);
        }
    }

    /// Run disconnect cleanup once; later calls return `None`
    pub fn close(&mut self) -> Option<DisconnectOutcome> {
        let previous = std::mem::replace(&mut self.state, ConnectionState::Disconnected);
        match (previous, &self.handle) {
            (ConnectionState::Connected, Some(handle)) => Some(self.hub.disconnect(handle)),
            _ => None,
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
