//! WebSocket connection registry
//!
//! Tracks every live channel and the single channel currently registered
//! for each user id. A later connect for the same user id overwrites the
//! earlier mapping (last-connect-wins); the displaced channel stays open but
//! is no longer reachable through `lookup`.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::messages::{ServerMessage, UserId};

/// Process-unique identifier of one accepted socket
pub type ConnectionId = Uuid;

/// Handle for sending messages to a specific WebSocket connection
///
/// Cloning is cheap; every clone pushes into the same outbound queue.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,

    /// User id supplied at handshake, `None` for anonymous channels
    user_id: Option<UserId>,

    /// Outbound queue drained by the socket's writer task
    sender: mpsc::UnboundedSender<ServerMessage>,

    /// When this connection was established (Unix timestamp ms)
    connected_at: i64,
}

impl ConnectionHandle {
    pub fn new(user_id: Option<UserId>, sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            sender,
            connected_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn connected_at(&self) -> i64 {
        self.connected_at
    }

    /// Best-effort, non-blocking push
    ///
    /// Fails only when the writer side of the socket is gone.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender
            .send(msg)
            .map_err(|_| SendError::ConnectionClosed(self.id))
    }

    /// Check if the connection is still alive
    pub fn is_alive(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Whether two handles refer to the same socket
    pub fn same_channel(&self, other: &ConnectionHandle) -> bool {
        self.id == other.id
    }
}

/// Registry of live channels
///
/// Uses DashMap for concurrent access without explicit locking.
/// Wrapped in Arc for cheap cloning.
#[derive(Debug, Clone, Default)]
pub struct ConnectionRegistry {
    /// Every live channel, anonymous ones included
    connections: Arc<DashMap<ConnectionId, ConnectionHandle>>,

    /// user_id -> most recently registered channel
    users: Arc<DashMap<UserId, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a live channel
    pub fn attach(&self, handle: ConnectionHandle) {
        tracing::trace!(connection_id = %handle.id(), "Connection attached");
        self.connections.insert(handle.id(), handle);
    }

    /// Stop tracking a channel
    pub fn detach(&self, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections.remove(&connection_id).map(|(_, handle)| handle)
    }

    /// Map `user_id` to `handle`, overwriting any earlier mapping
    ///
    /// Returns the displaced handle, which is left open.
    pub fn register(&self, user_id: &str, handle: ConnectionHandle) -> Option<ConnectionHandle> {
        let connection_id = handle.id();
        let displaced = self.users.insert(user_id.to_string(), handle);

        match &displaced {
            Some(previous) => tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                displaced_connection_id = %previous.id(),
                "User re-registered, newest connection wins"
            ),
            None => tracing::debug!(
                user_id = %user_id,
                connection_id = %connection_id,
                "User registered"
            ),
        }

        displaced
    }

    /// Current channel for `user_id`, if any
    pub fn lookup(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.users.get(user_id).map(|entry| entry.value().clone())
    }

    /// Remove the mapping for `user_id`; no-op when absent
    pub fn unregister(&self, user_id: &str) -> Option<ConnectionHandle> {
        self.users.remove(user_id).map(|(_, handle)| handle)
    }

    /// Remove the mapping only if it still points at `connection_id`
    ///
    /// Returns false when the user has since reconnected on another channel.
    pub fn unregister_connection(&self, user_id: &str, connection_id: ConnectionId) -> bool {
        self.users
            .remove_if(user_id, |_, handle| handle.id() == connection_id)
            .is_some()
    }

    /// Whether `user_id` currently has a registered channel
    pub fn is_online(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Sorted snapshot of registered user ids
    pub fn online_user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.users.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Snapshot of every live channel
    pub fn all_connections(&self) -> Vec<ConnectionHandle> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Handle for a live channel by id
    pub fn connection(&self, connection_id: ConnectionId) -> Option<ConnectionHandle> {
        self.connections
            .get(&connection_id)
            .map(|entry| entry.value().clone())
    }

    /// Number of live channels
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of registered users
    pub fn online_count(&self) -> usize {
        self.users.len()
    }
}

/// Error type for send operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    #[error("connection {0} closed")]
    ConnectionClosed(ConnectionId),
}
