//! Role- and ownership-based access control
//!
//! Single guard consumed by every booking-facing entry point. Identity is an
//! opaque claim produced by the authentication collaborator; this module only
//! decides what that claim may touch.

use crate::directory::ProviderDirectory;
use crate::error::{DispatchError, Result};
use crate::types::{Booking, ProviderId, Role, UserId};
use serde::{Deserialize, Serialize};

/// An authenticated identity with its role claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub name: String,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            role,
        }
    }

    pub fn customer(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self::new(user_id, name, Role::Customer)
    }

    pub fn provider(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self::new(user_id, name, Role::Provider)
    }

    pub fn admin(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self::new(user_id, name, Role::Admin)
    }
}

/// The capability an identity holds over a specific booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingActor {
    /// The owning customer
    Customer,
    /// The provider assigned to the booking
    AssignedProvider(ProviderId),
    /// Platform administrator, may access any booking
    Admin,
}

/// Require an exact role, failing with an explicit access-denied error.
/// Used for role-gated actions where denial is surfaced as forbidden.
pub fn require_role(identity: &Identity, role: Role) -> Result<()> {
    if identity.role == role {
        Ok(())
    } else {
        Err(DispatchError::AccessDenied {
            reason: format!("requires {role} role"),
        }
        .into())
    }
}

/// Resolve what capability, if any, an identity holds over a booking.
///
/// `None` means the caller must be answered with not-found rather than
/// forbidden, so unauthorized probes cannot confirm a booking exists.
pub fn resolve_booking_actor(
    booking: &Booking,
    identity: &Identity,
    directory: &dyn ProviderDirectory,
) -> Result<Option<BookingActor>> {
    if identity.role == Role::Admin {
        return Ok(Some(BookingActor::Admin));
    }

    if booking.customer == identity.user_id {
        return Ok(Some(BookingActor::Customer));
    }

    if identity.role == Role::Provider {
        if let Some(profile) = directory.find_by_owner(&identity.user_id)? {
            if profile.id == booking.provider {
                return Ok(Some(BookingActor::AssignedProvider(profile.id)));
            }
        }
    }

    Ok(None)
}
