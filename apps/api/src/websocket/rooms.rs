//! Group room subscriptions
//!
//! A room is the set of live channels that asked to receive a group's
//! broadcasts. Membership belongs to the channel, not the user: it is not
//! an authorization check and it does not survive a reconnect.

use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;

use super::connection::ConnectionId;
use super::messages::GroupId;

/// group_id -> subscribed channels
#[derive(Debug, Clone, Default)]
pub struct RoomMembership {
    rooms: Arc<DashMap<GroupId, HashSet<ConnectionId>>>,
}

impl RoomMembership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a channel; returns false if it was already a member
    pub fn join(&self, connection_id: ConnectionId, group_id: &str) -> bool {
        self.rooms
            .entry(group_id.to_string())
            .or_default()
            .insert(connection_id)
    }

    /// Unsubscribe a channel; returns false if it was not a member
    pub fn leave(&self, connection_id: ConnectionId, group_id: &str) -> bool {
        let removed = match self.rooms.get_mut(group_id) {
            Some(mut members) => members.remove(&connection_id),
            None => false,
        };

        self.rooms.remove_if(group_id, |_, members| members.is_empty());

        removed
    }

    /// Remove a closing channel from every room it joined
    pub fn leave_all(&self, connection_id: ConnectionId) -> Vec<GroupId> {
        let mut left = Vec::new();

        for mut room in self.rooms.iter_mut() {
            if room.value_mut().remove(&connection_id) {
                left.push(room.key().clone());
            }
        }

        self.rooms.retain(|_, members| !members.is_empty());

        left
    }

    /// Snapshot of a room's channels
    pub fn members(&self, group_id: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(group_id)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn is_member(&self, connection_id: ConnectionId, group_id: &str) -> bool {
        self.rooms
            .get(group_id)
            .map(|members| members.contains(&connection_id))
            .unwrap_or(false)
    }

    /// Number of rooms with at least one member
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
