//! Real-time channel hub
//!
//! Per-user and per-booking broadcast channels. Delivery is at-most-once
//! and fire-and-forget: a publish with no subscribers succeeds, and a
//! lagging subscriber loses the oldest events. Subscribers resync by
//! re-fetching state on reconnect. Dropping a receiver leaves the channel;
//! there is no explicit unsubscribe.

use crate::error::{DispatchError, Result};
use crate::types::{BookingId, PushEvent, UserId};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Logical channel address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ChannelKey {
    User(UserId),
    Booking(BookingId),
}

/// Hub of lazily created broadcast channels
pub struct ChannelHub {
    channels: RwLock<HashMap<ChannelKey, broadcast::Sender<PushEvent>>>,
    capacity: usize,
}

impl ChannelHub {
    /// Create a hub with the given per-channel buffer capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    fn sender(&self, key: ChannelKey) -> Result<broadcast::Sender<PushEvent>> {
        {
            let channels = self.channels.read().map_err(|_| DispatchError::Internal {
                message: "Failed to acquire channels read lock".to_string(),
            })?;
            if let Some(sender) = channels.get(&key) {
                return Ok(sender.clone());
            }
        }

        let mut channels = self.channels.write().map_err(|_| DispatchError::Internal {
            message: "Failed to acquire channels write lock".to_string(),
        })?;

        let sender = channels
            .entry(key)
            .or_insert_with(|| broadcast::channel(self.capacity).0);
        Ok(sender.clone())
    }

    /// Subscribe to a user's personal channel
    pub fn subscribe_user(&self, user_id: &UserId) -> Result<broadcast::Receiver<PushEvent>> {
        Ok(self.sender(ChannelKey::User(user_id.clone()))?.subscribe())
    }

    /// Subscribe to a booking's channel. Access control happens upstream;
    /// the hub itself is policy-free.
    pub fn subscribe_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<broadcast::Receiver<PushEvent>> {
        Ok(self
            .sender(ChannelKey::Booking(booking_id.clone()))?
            .subscribe())
    }

    /// Publish to a user's personal channel. A send with no subscribers
    /// is a successful no-op.
    pub fn publish_to_user(&self, user_id: &UserId, event: PushEvent) -> Result<()> {
        let sender = self.sender(ChannelKey::User(user_id.clone()))?;
        let _ = sender.send(event);
        Ok(())
    }

    /// Publish to a booking's channel
    pub fn publish_to_booking(&self, booking_id: &BookingId, event: PushEvent) -> Result<()> {
        let sender = self.sender(ChannelKey::Booking(booking_id.clone()))?;
        let _ = sender.send(event);
        Ok(())
    }

    /// Wrap a receiver into a stream, for boundary layers that forward
    /// events over a streaming transport.
    pub fn into_stream(receiver: broadcast::Receiver<PushEvent>) -> BroadcastStream<PushEvent> {
        BroadcastStream::new(receiver)
    }

    /// Number of live channels (for health reporting)
    pub fn channel_count(&self) -> usize {
        self.channels.read().map(|c| c.len()).unwrap_or(0)
    }
}
