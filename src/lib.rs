//! Instaserve - Booking assignment and lifecycle engine
//!
//! This crate provides the core of an on-demand local services
//! marketplace: provider assignment under an availability mutex, the
//! booking state machine, and real-time event fan-out to per-user and
//! per-booking channels.

pub mod access;
pub mod assignment;
pub mod booking;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod metrics;
pub mod notify;
pub mod service;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{DispatchError, Result};
pub use types::*;

// Re-export key components
pub use access::Identity;
pub use assignment::AssignmentEngine;
pub use booking::BookingManager;
pub use catalog::ServiceCatalog;
pub use directory::{InMemoryProviderDirectory, ProviderDirectory};
pub use notify::{ChannelHub, Notifier};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
