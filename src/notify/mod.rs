//! Notification persistence and real-time fan-out
//!
//! Every lifecycle event of interest produces a durable notification
//! record for its recipient and a best-effort push on the per-user and
//! per-booking channels. Push loss never loses the underlying state
//! change; the stores remain the source of truth.

pub mod hub;
pub mod notifier;
pub mod store;

// Re-export commonly used types
pub use hub::ChannelHub;
pub use notifier::{NotificationDraft, Notifier};
pub use store::{InMemoryNotificationStore, NotificationStore};
