//! Utility functions for the dispatch engine

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Three-digit suffix (100..=999) derived from UUID v4 randomness
fn random_suffix() -> u32 {
    (Uuid::new_v4().as_u128() % 900) as u32 + 100
}

/// Generate a human-readable booking id: fixed prefix, creation epoch
/// millis and a random suffix. Uniqueness is a soft guarantee.
pub fn generate_booking_id() -> String {
    format!("SRV{}{}", Utc::now().timestamp_millis(), random_suffix())
}

/// Generate a synthetic payment transaction id
pub fn generate_txn_id() -> String {
    format!("TXN{}{}", Utc::now().timestamp_millis(), random_suffix())
}

/// Generate a new unique notification id
pub fn generate_notification_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique provider id
pub fn generate_provider_id() -> Uuid {
    Uuid::new_v4()
}
