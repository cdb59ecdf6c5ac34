//! Application notifications
//!
//! The chat application calls these after its durable write succeeded.
//! Each helper resolves to `Notifier` calls with a fixed event name, so
//! clients can rely on stable names and payload shapes. Delivery is
//! best-effort: an offline recipient simply misses the push and picks the
//! change up from storage on its next fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::websocket::{GroupId, Notifier, UserDescriptor, UserId};

pub const EVENT_NEW_MESSAGE: &str = "newMessage";
pub const EVENT_NEW_GROUP_MESSAGE: &str = "newGroupMessage";
pub const EVENT_FRIEND_REQUEST: &str = "friendRequest";
pub const EVENT_FRIEND_REQUEST_ACCEPTED: &str = "friendRequestAccepted";
pub const EVENT_ADDED_TO_GROUP: &str = "addedToGroup";
pub const EVENT_REMOVED_FROM_GROUP: &str = "removedFromGroup";
pub const EVENT_GROUP_UPDATED: &str = "groupUpdated";
pub const EVENT_MESSAGES_READ: &str = "messagesRead";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to encode notification payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<NotificationError> for crate::error::ApiError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Serialization(e) => crate::error::ApiError::Serialization(e),
        }
    }
}

pub type NotificationResult<T> = Result<T, NotificationError>;

/// Message body type
///
/// Voice notes and images are ordinary messages whose `mediaUrl` points at
/// the stored upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageKind {
    Text,
    Image,
    VoiceNote,
}

/// A stored message, direct or group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageNotice {
    pub message_id: Uuid,
    pub conversation_id: String,
    pub sender: UserDescriptor,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestNotice {
    pub request_id: Uuid,
    /// The user who sent the request, or accepted it for an acceptance
    pub from: UserDescriptor,
    pub created_at: DateTime<Utc>,
}

/// A change to a group's metadata or roster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupChangeNotice {
    pub group_id: GroupId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Member added or removed, if the change concerns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed_by: Option<UserId>,
}

impl GroupChangeNotice {
    pub fn new(group_id: impl Into<GroupId>) -> Self {
        Self {
            group_id: group_id.into(),
            name: None,
            member_id: None,
            changed_by: None,
        }
    }

    pub fn with_member(mut self, member_id: impl Into<UserId>) -> Self {
        self.member_id = Some(member_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn changed_by(mut self, user_id: impl Into<UserId>) -> Self {
        self.changed_by = Some(user_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceiptNotice {
    pub conversation_id: String,
    pub reader_id: UserId,
    pub last_read_message_id: Uuid,
    pub read_at: DateTime<Utc>,
}

/// Who a read receipt is delivered to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptTarget {
    /// The other participant of a direct conversation
    Direct(UserId),
    /// Everyone subscribed to the group's room
    Group(GroupId),
}

/// Typed front for application events
#[derive(Clone)]
pub struct NotificationService {
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService").finish_non_exhaustive()
    }
}

impl NotificationService {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Whether a push to `user_id` would currently be delivered
    pub fn is_online(&self, user_id: &str) -> bool {
        self.notifier.is_online(user_id)
    }

    /// Push a direct message to its recipient
    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    pub fn direct_message(&self, recipient: &str, message: &MessageNotice) -> NotificationResult<bool> {
        self.to_user(recipient, EVENT_NEW_MESSAGE, message)
    }

    /// Push a group message to the group's room
    #[instrument(skip(self, message), fields(message_id = %message.message_id))]
    pub fn group_message(&self, group_id: &str, message: &MessageNotice) -> NotificationResult<usize> {
        self.to_room(group_id, EVENT_NEW_GROUP_MESSAGE, message)
    }

    pub fn friend_request(
        &self,
        addressee: &str,
        request: &FriendRequestNotice,
    ) -> NotificationResult<bool> {
        self.to_user(addressee, EVENT_FRIEND_REQUEST, request)
    }

    /// Tell the original requester their request was accepted
    pub fn friend_request_accepted(
        &self,
        requester: &str,
        acceptance: &FriendRequestNotice,
    ) -> NotificationResult<bool> {
        self.to_user(requester, EVENT_FRIEND_REQUEST_ACCEPTED, acceptance)
    }

    /// Tell the new member, then the group's room
    ///
    /// A new member only hears `groupUpdated` once its client joins the room.
    pub fn group_member_added(
        &self,
        member_id: &str,
        change: &GroupChangeNotice,
    ) -> NotificationResult<usize> {
        let direct = self.to_user(member_id, EVENT_ADDED_TO_GROUP, change)?;
        let room = self.to_room(&change.group_id, EVENT_GROUP_UPDATED, change)?;
        Ok(usize::from(direct) + room)
    }

    /// Tell the removed member, then the group's room
    ///
    /// The removed member's channel stays in the room until its client
    /// leaves; rooms are not an authorization boundary.
    pub fn group_member_removed(
        &self,
        member_id: &str,
        change: &GroupChangeNotice,
    ) -> NotificationResult<usize> {
        let direct = self.to_user(member_id, EVENT_REMOVED_FROM_GROUP, change)?;
        let room = self.to_room(&change.group_id, EVENT_GROUP_UPDATED, change)?;
        Ok(usize::from(direct) + room)
    }

    pub fn group_updated(&self, change: &GroupChangeNotice) -> NotificationResult<usize> {
        self.to_room(&change.group_id, EVENT_GROUP_UPDATED, change)
    }

    pub fn read_receipt(
        &self,
        target: &ReceiptTarget,
        receipt: &ReadReceiptNotice,
    ) -> NotificationResult<usize> {
        match target {
            ReceiptTarget::Direct(user_id) => self
                .to_user(user_id, EVENT_MESSAGES_READ, receipt)
                .map(usize::from),
            ReceiptTarget::Group(group_id) => self.to_room(group_id, EVENT_MESSAGES_READ, receipt),
        }
    }

    fn to_user<T: Serialize>(&self, user_id: &str, event: &str, body: &T) -> NotificationResult<bool> {
        let payload = serde_json::to_value(body)?;
        let delivered = self.notifier.emit(user_id, event, payload);
        debug!(user_id = %user_id, event, delivered, "Application event");
        Ok(delivered)
    }

    fn to_room<T: Serialize>(&self, group_id: &str, event: &str, body: &T) -> NotificationResult<usize> {
        let payload = serde_json::to_value(body)?;
        let recipients = self.notifier.emit_to_room(group_id, event, payload);
        debug!(group_id = %group_id, event, recipients, "Application room event");
        Ok(recipients)
    }
}
