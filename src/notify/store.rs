//! Notification storage interface and in-memory implementation

use crate::error::{DispatchError, Result};
use crate::types::{Notification, UserId};
use std::sync::RwLock;
use uuid::Uuid;

/// Trait for notification storage operations
pub trait NotificationStore: Send + Sync {
    /// Persist a new notification record
    fn insert(&self, notification: Notification) -> Result<()>;

    /// Most recent notifications for a recipient, newest first
    fn list_for_recipient(&self, recipient: &UserId, limit: usize) -> Result<Vec<Notification>>;

    /// Number of unread notifications for a recipient
    fn unread_count(&self, recipient: &UserId) -> Result<usize>;

    /// Flip read false -> true on a recipient's own notification.
    /// Returns `None` when the id does not exist for that recipient.
    fn mark_read(&self, id: Uuid, recipient: &UserId) -> Result<Option<Notification>>;

    /// Total number of stored notifications
    fn notification_count(&self) -> Result<usize>;
}

/// In-memory notification storage. Records are never deleted; retention
/// is out of scope.
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    notifications: RwLock<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_all(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<Notification>>> {
        self.notifications.read().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire notifications read lock".to_string(),
            }
            .into()
        })
    }

    fn write_all(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<Notification>>> {
        self.notifications.write().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire notifications write lock".to_string(),
            }
            .into()
        })
    }
}

impl NotificationStore for InMemoryNotificationStore {
    fn insert(&self, notification: Notification) -> Result<()> {
        let mut all = self.write_all()?;
        all.push(notification);
        Ok(())
    }

    fn list_for_recipient(&self, recipient: &UserId, limit: usize) -> Result<Vec<Notification>> {
        let all = self.read_all()?;

        let mut matching: Vec<Notification> = all
            .iter()
            .filter(|n| &n.recipient == recipient)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);

        Ok(matching)
    }

    fn unread_count(&self, recipient: &UserId) -> Result<usize> {
        let all = self.read_all()?;
        Ok(all
            .iter()
            .filter(|n| &n.recipient == recipient && !n.read)
            .count())
    }

    fn mark_read(&self, id: Uuid, recipient: &UserId) -> Result<Option<Notification>> {
        let mut all = self.write_all()?;

        let Some(notification) = all
            .iter_mut()
            .find(|n| n.id == id && &n.recipient == recipient)
        else {
            return Ok(None);
        };

        notification.read = true;
        Ok(Some(notification.clone()))
    }

    fn notification_count(&self) -> Result<usize> {
        let all = self.read_all()?;
        Ok(all.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NotificationKind;
    use crate::utils::{current_timestamp, generate_notification_id};
    use chrono::Duration;

    fn test_notification(recipient: &str, minutes_ago: i64) -> Notification {
        Notification {
            id: generate_notification_id(),
            recipient: recipient.to_string(),
            booking_id: Some("SRV1000".to_string()),
            kind: NotificationKind::BookingCreated,
            title: "Booking created".to_string(),
            body: "Booking SRV1000 has been assigned".to_string(),
            action: None,
            read: false,
            created_at: current_timestamp() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_feed_is_newest_first_and_limited() {
        let store = InMemoryNotificationStore::new();
        store.insert(test_notification("user-1", 30)).unwrap();
        store.insert(test_notification("user-1", 10)).unwrap();
        store.insert(test_notification("user-1", 20)).unwrap();
        store.insert(test_notification("user-2", 5)).unwrap();

        let feed = store.list_for_recipient(&"user-1".to_string(), 2).unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed[0].created_at > feed[1].created_at);
    }

    #[test]
    fn test_unread_count_and_mark_read() {
        let store = InMemoryNotificationStore::new();
        let notification = test_notification("user-1", 0);
        let id = notification.id;
        store.insert(notification).unwrap();
        store.insert(test_notification("user-1", 1)).unwrap();

        assert_eq!(store.unread_count(&"user-1".to_string()).unwrap(), 2);

        let updated = store.mark_read(id, &"user-1".to_string()).unwrap().unwrap();
        assert!(updated.read);
        assert_eq!(store.unread_count(&"user-1".to_string()).unwrap(), 1);
    }

    #[test]
    fn test_mark_read_is_recipient_scoped() {
        let store = InMemoryNotificationStore::new();
        let notification = test_notification("user-1", 0);
        let id = notification.id;
        store.insert(notification).unwrap();

        // Another user cannot acknowledge someone else's notification
        let result = store.mark_read(id, &"user-2".to_string()).unwrap();
        assert!(result.is_none());
        assert_eq!(store.unread_count(&"user-1".to_string()).unwrap(), 1);
    }
}
