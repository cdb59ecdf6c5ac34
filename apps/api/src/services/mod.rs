//! Services layered on top of the realtime core
//!
//! - Typed application notifications (messages, friend requests, group
//!   changes, read receipts) delivered through the `Notifier` surface

pub mod notifications;

pub use notifications::{
    FriendRequestNotice, GroupChangeNotice, MessageKind, MessageNotice, NotificationError,
    NotificationService, ReadReceiptNotice, ReceiptTarget,
};
