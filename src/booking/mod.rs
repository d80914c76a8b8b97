//! Booking lifecycle management
//!
//! This module owns the booking aggregate: creation through assignment,
//! the accept/reject/update/cancel/rate/pay transitions, chat messages,
//! and the per-actor read views.

pub mod manager;

// Re-export commonly used types
pub use manager::{BookingManager, BookingManagerStats};
