//! Notification creation and push fan-out
//!
//! The notifier persists a notification record, then pushes the
//! corresponding events. Persistence is the durable truth; pushes are a
//! low-latency refresh hint only.

use crate::error::Result;
use crate::notify::hub::ChannelHub;
use crate::notify::store::NotificationStore;
use crate::types::{
    ActionHint, BookingId, BookingSummary, ChatMessage, Notification, NotificationKind, PushEvent,
    UserId,
};
use crate::utils::{current_timestamp, generate_notification_id};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// The fields a caller supplies to raise a notification
#[derive(Debug, Clone)]
pub struct NotificationDraft {
    pub recipient: UserId,
    pub booking_id: Option<BookingId>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub action: Option<ActionHint>,
}

/// Persists notifications and fans events out to the channel hub
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    hub: Arc<ChannelHub>,
}

impl Notifier {
    pub fn new(store: Arc<dyn NotificationStore>, hub: Arc<ChannelHub>) -> Self {
        Self { store, hub }
    }

    /// Persist a notification and push `notification:new` on the
    /// recipient's channel.
    pub fn notify(&self, draft: NotificationDraft) -> Result<Notification> {
        let notification = Notification {
            id: generate_notification_id(),
            recipient: draft.recipient,
            booking_id: draft.booking_id,
            kind: draft.kind,
            title: draft.title,
            body: draft.body,
            action: draft.action,
            read: false,
            created_at: current_timestamp(),
        };

        self.store.insert(notification.clone())?;

        self.hub.publish_to_user(
            &notification.recipient,
            PushEvent::NotificationNew {
                notification: notification.clone(),
            },
        )?;

        debug!(
            "Notified {} ({:?}) for booking {:?}",
            notification.recipient, notification.kind, notification.booking_id
        );

        Ok(notification)
    }

    /// Push the full updated booking on its channel
    pub fn push_booking_update(&self, booking_id: &BookingId, booking: BookingSummary) -> Result<()> {
        self.hub.publish_to_booking(
            booking_id,
            PushEvent::BookingUpdate {
                booking_id: booking_id.clone(),
                booking,
            },
        )
    }

    /// Push a chat message on the booking channel
    pub fn push_chat_message(&self, booking_id: &BookingId, message: ChatMessage) -> Result<()> {
        self.hub.publish_to_booking(
            booking_id,
            PushEvent::Message {
                booking_id: booking_id.clone(),
                message,
            },
        )
    }

    /// Recipient feed, newest first
    pub fn feed(&self, recipient: &UserId, limit: usize) -> Result<Vec<Notification>> {
        self.store.list_for_recipient(recipient, limit)
    }

    /// Unread badge count for a recipient
    pub fn unread_count(&self, recipient: &UserId) -> Result<usize> {
        self.store.unread_count(recipient)
    }

    /// Acknowledge a notification; recipient-scoped
    pub fn mark_read(&self, id: Uuid, recipient: &UserId) -> Result<Option<Notification>> {
        self.store.mark_read(id, recipient)
    }

    /// Total persisted notifications (for health reporting)
    pub fn notification_count(&self) -> Result<usize> {
        self.store.notification_count()
    }
}
