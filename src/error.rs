//! Error types for the dispatch engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific dispatch scenarios
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid request: {reason}")]
    Validation { reason: String },

    #[error("access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("booking {booking_id} cannot {action} while {status}")]
    InvalidState {
        booking_id: String,
        action: String,
        status: String,
    },

    #[error("{entity} not found")]
    NotFound { entity: String },

    #[error("no provider could be assigned: {reason}")]
    ProviderContention { reason: String },

    #[error("already done: {reason}")]
    AlreadyDone { reason: String },

    #[error("internal service error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    /// Machine-checkable failure kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation { .. } => "VALIDATION",
            DispatchError::AccessDenied { .. } => "ACCESS_DENIED",
            DispatchError::InvalidState { .. } => "INVALID_STATE",
            DispatchError::NotFound { .. } => "NOT_FOUND",
            DispatchError::ProviderContention { .. } => "RESOURCE_CONTENTION",
            DispatchError::AlreadyDone { .. } => "ALREADY_DONE",
            DispatchError::Internal { .. } => "INFRASTRUCTURE",
        }
    }
}
