//! Common types used throughout the dispatch engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for users (opaque, issued by the identity collaborator)
pub type UserId = String;

/// Unique identifier for provider profiles
pub type ProviderId = Uuid;

/// External-facing booking identifier (e.g. `SRV1699900000000123`)
pub type BookingId = String;

/// Role attached to an authenticated identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "CUSTOMER"),
            Role::Provider => write!(f, "PROVIDER"),
            Role::Admin => write!(f, "ADMIN"),
        }
    }
}

/// A geographic coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Active,
    Rejected,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Rejected | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "PENDING"),
            BookingStatus::Active => write!(f, "ACTIVE"),
            BookingStatus::Rejected => write!(f, "REJECTED"),
            BookingStatus::Completed => write!(f, "COMPLETED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Payment state for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// Which party authored an in-booking chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SenderRole {
    Customer,
    Provider,
}

/// A chat message embedded in a booking. Immutable once appended;
/// insertion order is chronological and authoritative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_role: SenderRole,
    pub sender_id: UserId,
    pub sender_name: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

/// A service-offering profile held by the provider directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: ProviderId,
    /// Owning user, absent for seed-imported profiles
    pub owner: Option<UserId>,
    pub name: String,
    pub service_type: String,
    pub rating: f64,
    /// Availability is the assignment mutex: `true` = assignable
    pub availability: bool,
    pub location: GeoPoint,
    pub image_url: String,
}

/// The central booking aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: BookingId,
    pub customer: UserId,
    /// Display name snapshotted from the creating identity
    pub customer_name: String,
    pub provider: ProviderId,
    pub service_type: String,
    pub status: BookingStatus,
    pub eta_at: DateTime<Utc>,
    pub eta_minutes: u32,
    pub distance_km: f64,
    pub price: u32,
    pub customer_location: GeoPoint,
    pub is_emergency: bool,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_txn_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub messages: Vec<ChatMessage>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Notification type tags, one per lifecycle event of interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    BookingCreated,
    BookingAssigned,
    BookingAccepted,
    BookingRejected,
    BookingUpdated,
    BookingCancelled,
    PaymentUpdate,
    NewMessage,
}

impl NotificationKind {
    /// Stable wire/metrics label
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingCreated => "BOOKING_CREATED",
            NotificationKind::BookingAssigned => "BOOKING_ASSIGNED",
            NotificationKind::BookingAccepted => "BOOKING_ACCEPTED",
            NotificationKind::BookingRejected => "BOOKING_REJECTED",
            NotificationKind::BookingUpdated => "BOOKING_UPDATED",
            NotificationKind::BookingCancelled => "BOOKING_CANCELLED",
            NotificationKind::PaymentUpdate => "PAYMENT_UPDATE",
            NotificationKind::NewMessage => "NEW_MESSAGE",
        }
    }
}

/// Hint to the client about which follow-up action the notification invites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionHint {
    RespondBooking,
    Rebook,
}

/// A persisted notification record; mutated only by read acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: UserId,
    pub booking_id: Option<BookingId>,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub action: Option<ActionHint>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to create a booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub service_type: String,
    /// Defaults to the configured fallback coordinate when omitted
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub is_emergency: bool,
    pub payment_method: Option<String>,
    pub preferred_provider: Option<ProviderId>,
}

/// Provider-side action on a pending or active booking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum ProviderAction {
    Accept { note: Option<String> },
    Reject,
    Update {
        eta_minutes: Option<u32>,
        note: Option<String>,
    },
}

impl ProviderAction {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderAction::Accept { .. } => "ACCEPT",
            ProviderAction::Reject => "REJECT",
            ProviderAction::Update { .. } => "UPDATE",
        }
    }
}

/// Payment-facing view returned by the pay operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub booking_id: BookingId,
    pub payment_status: PaymentStatus,
    pub payment_txn_id: String,
    pub paid_at: DateTime<Utc>,
    pub payment_method: String,
}

/// Wire view of a booking: the full payload pushed to subscribers and
/// returned from read/mutate operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSummary {
    pub booking_id: BookingId,
    pub service_type: String,
    pub status: BookingStatus,
    pub eta_at: DateTime<Utc>,
    pub eta_minutes: u32,
    pub distance_km: f64,
    pub price: u32,
    pub is_emergency: bool,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub payment_txn_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub rating: Option<u8>,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Booking> for BookingSummary {
    fn from(booking: &Booking) -> Self {
        Self {
            booking_id: booking.booking_id.clone(),
            service_type: booking.service_type.clone(),
            status: booking.status,
            eta_at: booking.eta_at,
            eta_minutes: booking.eta_minutes,
            distance_km: booking.distance_km,
            price: booking.price,
            is_emergency: booking.is_emergency,
            payment_method: booking.payment_method.clone(),
            payment_status: booking.payment_status,
            payment_txn_id: booking.payment_txn_id.clone(),
            paid_at: booking.paid_at,
            rating: booking.rating,
            review: booking.review.clone(),
            created_at: booking.created_at,
        }
    }
}

/// Assigned-provider view returned alongside a freshly created booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedProviderSummary {
    pub id: ProviderId,
    pub name: String,
    pub rating: f64,
    pub image_url: String,
    pub distance_km: f64,
    pub status: String,
}

/// Result of a successful booking creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking: BookingSummary,
    pub provider: AssignedProviderSummary,
}

/// Customer view embedded in booking detail and provider assignments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: UserId,
    pub name: String,
    pub location: Option<GeoPoint>,
}

/// Provider view embedded in booking detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub id: ProviderId,
    pub name: String,
    pub rating: f64,
    pub image_url: String,
    pub location: GeoPoint,
}

impl From<&ProviderProfile> for ProviderSummary {
    fn from(profile: &ProviderProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name.clone(),
            rating: profile.rating,
            image_url: profile.image_url.clone(),
            location: profile.location,
        }
    }
}

/// Full booking view per the access rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDetail {
    pub booking: BookingSummary,
    pub provider: Option<ProviderSummary>,
    pub customer: CustomerSummary,
}

/// One entry in a customer's booking history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub booking_id: BookingId,
    pub service_type: String,
    pub status: BookingStatus,
    pub eta_at: DateTime<Utc>,
    pub eta_minutes: u32,
    pub distance_km: f64,
    pub price: u32,
    pub is_emergency: bool,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub provider_name: String,
}

/// One entry in a provider's assignment list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentEntry {
    pub booking_id: BookingId,
    pub service_type: String,
    pub status: BookingStatus,
    pub eta_at: DateTime<Utc>,
    pub eta_minutes: u32,
    pub distance_km: f64,
    pub price: u32,
    pub is_emergency: bool,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub customer: CustomerSummary,
}

/// Provider's own profile view plus their assignment history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderAssignments {
    pub provider: ProviderProfile,
    pub bookings: Vec<AssignmentEntry>,
}

/// Nearby-provider listing entry with a standard (non-emergency) ETA quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearbyProvider {
    pub id: ProviderId,
    pub name: String,
    pub service_type: String,
    pub rating: f64,
    pub image_url: String,
    pub location: GeoPoint,
    pub distance_km: f64,
    pub eta_minutes: u32,
    pub availability: bool,
}

/// Notification feed with its unread badge count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

/// Admin-only metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOverview {
    pub total_bookings: usize,
    pub active_bookings: usize,
    pub pending_bookings: usize,
    pub completed_bookings: usize,
    pub total_providers: usize,
    pub recent_bookings: Vec<RecentBooking>,
}

/// Compact row in the admin overview's recent list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentBooking {
    pub booking_id: BookingId,
    pub service_type: String,
    pub status: BookingStatus,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
}

/// Union of events pushed on real-time channels. Payloads carry the full
/// updated object so subscribers can replace local state wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    #[serde(rename = "message")]
    Message {
        booking_id: BookingId,
        message: ChatMessage,
    },
    #[serde(rename = "booking:update")]
    BookingUpdate {
        booking_id: BookingId,
        booking: BookingSummary,
    },
    #[serde(rename = "notification:new")]
    NotificationNew { notification: Notification },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_terminality() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_status_serializes_uppercase() {
        let json = serde_json::to_string(&BookingStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");

        let kind = serde_json::to_string(&NotificationKind::BookingAssigned).unwrap();
        assert_eq!(kind, "\"BOOKING_ASSIGNED\"");
    }

    #[test]
    fn test_push_event_wire_names() {
        let event = PushEvent::NotificationNew {
            notification: Notification {
                id: Uuid::new_v4(),
                recipient: "user-1".to_string(),
                booking_id: None,
                kind: NotificationKind::BookingCreated,
                title: "Booking created".to_string(),
                body: "created".to_string(),
                action: None,
                read: false,
                created_at: Utc::now(),
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "notification:new");

        let update = PushEvent::BookingUpdate {
            booking_id: "SRV1".to_string(),
            booking: BookingSummary {
                booking_id: "SRV1".to_string(),
                service_type: "Plumbing".to_string(),
                status: BookingStatus::Pending,
                eta_at: Utc::now(),
                eta_minutes: 15,
                distance_km: 1.2,
                price: 349,
                is_emergency: false,
                payment_method: "Cash".to_string(),
                payment_status: PaymentStatus::Pending,
                payment_txn_id: None,
                paid_at: None,
                rating: None,
                review: None,
                created_at: Utc::now(),
            },
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["event"], "booking:update");
        assert_eq!(json["data"]["booking"]["status"], "PENDING");
    }

    #[test]
    fn test_provider_action_roundtrip() {
        let action: ProviderAction =
            serde_json::from_str(r#"{"action":"ACCEPT","note":"on my way"}"#).unwrap();
        assert_eq!(action.name(), "ACCEPT");

        let action: ProviderAction = serde_json::from_str(r#"{"action":"REJECT"}"#).unwrap();
        assert_eq!(action.name(), "REJECT");
    }
}
