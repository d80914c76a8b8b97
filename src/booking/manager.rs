//! Booking manager implementation
//!
//! The manager owns the booking map and applies every lifecycle
//! transition, validating the acting identity against the access guard
//! and fanning events out after each applied change. Mutations happen
//! inside a single write-lock scope; notifications and pushes happen
//! after the lock is dropped.

use crate::access::{self, BookingActor, Identity};
use crate::assignment::{AssignmentEngine, AssignmentRequest};
use crate::catalog::ServiceCatalog;
use crate::directory::ProviderDirectory;
use crate::error::{DispatchError, Result};
use crate::geo::{self, EtaPolicy};
use crate::metrics::MetricsCollector;
use crate::notify::{ChannelHub, NotificationDraft, Notifier};
use crate::types::{
    ActionHint, AdminOverview, AssignedProviderSummary, AssignmentEntry, Booking, BookingDetail,
    BookingId, BookingReceipt, BookingRequest, BookingStatus, BookingSummary, ChatMessage,
    CustomerSummary, HistoryEntry, NearbyProvider, Notification, NotificationFeed,
    NotificationKind, PaymentReceipt, PaymentStatus, ProviderAction, ProviderAssignments,
    ProviderProfile, ProviderSummary, PushEvent, Role,
};
use crate::utils::{current_timestamp, generate_booking_id, generate_txn_id};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Statistics about booking manager operations
#[derive(Debug, Clone, Default)]
pub struct BookingManagerStats {
    /// Total bookings created
    pub bookings_created: u64,
    /// Total bookings accepted by their provider
    pub bookings_accepted: u64,
    /// Total bookings rejected by their provider
    pub bookings_rejected: u64,
    /// Total bookings cancelled by their customer
    pub bookings_cancelled: u64,
    /// Total bookings completed through rating
    pub bookings_completed: u64,
    /// Total payments recorded
    pub payments_recorded: u64,
    /// Total chat messages appended
    pub messages_sent: u64,
    /// Assignment attempts that found no provider
    pub assignments_failed: u64,
    /// Current bookings in PENDING
    pub pending_bookings: usize,
    /// Current bookings in ACTIVE
    pub active_bookings: usize,
}

/// The main booking manager
#[derive(Clone)]
pub struct BookingManager {
    /// Map of bookings by external id
    bookings: Arc<RwLock<HashMap<BookingId, Booking>>>,
    /// Provider directory (availability mutex lives here)
    directory: Arc<dyn ProviderDirectory>,
    /// Assignment engine for new bookings
    engine: Arc<AssignmentEngine>,
    /// Pricing and alias tables
    catalog: Arc<ServiceCatalog>,
    /// ETA quote policy
    eta_policy: EtaPolicy,
    /// Notification persistence + fan-out
    notifier: Arc<Notifier>,
    /// Real-time channel hub
    hub: Arc<ChannelHub>,
    /// Metrics collector
    metrics: Arc<MetricsCollector>,
    /// Manager statistics
    stats: Arc<RwLock<BookingManagerStats>>,
    /// Maximum entries in the nearby listing
    nearby_limit: usize,
    /// Maximum entries in the notification feed
    feed_limit: usize,
}

impl BookingManager {
    /// Create a new booking manager with default policy and metrics
    pub fn new(
        directory: Arc<dyn ProviderDirectory>,
        engine: Arc<AssignmentEngine>,
        catalog: Arc<ServiceCatalog>,
        notifier: Arc<Notifier>,
        hub: Arc<ChannelHub>,
    ) -> Self {
        Self::with_settings(
            directory,
            engine,
            catalog,
            notifier,
            hub,
            EtaPolicy::default(),
            Arc::new(MetricsCollector::default()),
            10,
            50,
        )
    }

    /// Create with explicit policy, metrics, and listing limits
    #[allow(clippy::too_many_arguments)]
    pub fn with_settings(
        directory: Arc<dyn ProviderDirectory>,
        engine: Arc<AssignmentEngine>,
        catalog: Arc<ServiceCatalog>,
        notifier: Arc<Notifier>,
        hub: Arc<ChannelHub>,
        eta_policy: EtaPolicy,
        metrics: Arc<MetricsCollector>,
        nearby_limit: usize,
        feed_limit: usize,
    ) -> Self {
        Self {
            bookings: Arc::new(RwLock::new(HashMap::new())),
            directory,
            engine,
            catalog,
            eta_policy,
            notifier,
            hub,
            metrics,
            stats: Arc::new(RwLock::new(BookingManagerStats::default())),
            nearby_limit,
            feed_limit,
        }
    }

    fn read_bookings(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<BookingId, Booking>>> {
        self.bookings.read().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire bookings read lock".to_string(),
            }
            .into()
        })
    }

    fn write_bookings(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<BookingId, Booking>>> {
        self.bookings.write().map_err(|_| {
            DispatchError::Internal {
                message: "Failed to acquire bookings write lock".to_string(),
            }
            .into()
        })
    }

    fn update_stats(&self, apply: impl FnOnce(&mut BookingManagerStats)) -> Result<()> {
        let mut stats = self.stats.write().map_err(|_| DispatchError::Internal {
            message: "Failed to acquire stats lock".to_string(),
        })?;
        apply(&mut stats);
        Ok(())
    }

    /// Persist a notification, recording its metric
    fn raise(&self, draft: NotificationDraft) -> Result<Notification> {
        self.metrics.record_notification(draft.kind.as_str());
        self.notifier.notify(draft)
    }

    fn booking_not_found() -> anyhow::Error {
        DispatchError::NotFound {
            entity: "booking".to_string(),
        }
        .into()
    }

    fn invalid_state(booking: &Booking, action: &str) -> anyhow::Error {
        DispatchError::InvalidState {
            booking_id: booking.booking_id.clone(),
            action: action.to_string(),
            status: booking.status.to_string(),
        }
        .into()
    }

    /// Handle a booking creation request from a customer.
    ///
    /// Locks exactly one provider, persists the booking, and notifies both
    /// parties. If persistence fails after the lock succeeded, the provider
    /// is released before the error is returned.
    pub async fn create_booking(
        &self,
        identity: &Identity,
        request: BookingRequest,
    ) -> Result<BookingReceipt> {
        if identity.role == Role::Provider {
            return Err(DispatchError::AccessDenied {
                reason: "providers cannot create customer bookings".to_string(),
            }
            .into());
        }

        let start_time = Instant::now();
        info!(
            "Processing booking request - customer: '{}', service: '{}', emergency: {}",
            identity.user_id, request.service_type, request.is_emergency
        );

        let assignment = match self.engine.assign(&AssignmentRequest {
            service_type: request.service_type.clone(),
            location: request.location,
            preferred_provider: request.preferred_provider,
        }) {
            Ok(assignment) => assignment,
            Err(e) => {
                self.metrics
                    .record_assignment("failed", start_time.elapsed());
                self.update_stats(|stats| stats.assignments_failed += 1)?;
                return Err(e);
            }
        };
        self.metrics
            .record_assignment("success", start_time.elapsed());

        let provider = assignment.provider.clone();
        let location = request.location.unwrap_or(self.engine.fallback_location());
        let eta = self
            .eta_policy
            .estimate(assignment.distance_km, request.is_emergency);
        let price = self.catalog.quote(&request.service_type, request.is_emergency);
        let now = current_timestamp();

        let booking = Booking {
            booking_id: generate_booking_id(),
            customer: identity.user_id.clone(),
            customer_name: identity.name.clone(),
            provider: provider.id,
            service_type: request.service_type.clone(),
            status: BookingStatus::Pending,
            eta_at: eta.arrival_at,
            eta_minutes: eta.minutes,
            distance_km: assignment.distance_km,
            price,
            customer_location: location,
            is_emergency: request.is_emergency,
            payment_method: request.payment_method.unwrap_or_else(|| "Cash".to_string()),
            payment_status: PaymentStatus::Pending,
            payment_txn_id: None,
            paid_at: None,
            messages: Vec::new(),
            rating: None,
            review: None,
            created_at: now,
            updated_at: now,
        };

        // Compensate the provider lock if persistence fails, so a failed
        // creation never strands a provider as unavailable.
        let persisted = (|| -> Result<()> {
            let mut bookings = self.write_bookings()?;
            bookings.insert(booking.booking_id.clone(), booking.clone());
            Ok(())
        })();
        if let Err(e) = persisted {
            warn!(
                "Persist failed after locking provider {}, releasing: {}",
                provider.id, e
            );
            self.directory.release(provider.id)?;
            return Err(e);
        }

        self.update_stats(|stats| stats.bookings_created += 1)?;
        self.metrics
            .record_booking_created(&request.service_type, request.is_emergency);

        if let Some(owner) = &provider.owner {
            self.raise(NotificationDraft {
                recipient: owner.clone(),
                booking_id: Some(booking.booking_id.clone()),
                kind: NotificationKind::BookingAssigned,
                title: "New booking request".to_string(),
                body: format!("{} booking needs your action", booking.service_type),
                action: Some(ActionHint::RespondBooking),
            })?;
        }

        self.raise(NotificationDraft {
            recipient: identity.user_id.clone(),
            booking_id: Some(booking.booking_id.clone()),
            kind: NotificationKind::BookingCreated,
            title: "Booking created".to_string(),
            body: format!(
                "Booking {} has been assigned and is waiting for provider acceptance",
                booking.booking_id
            ),
            action: None,
        })?;

        let summary = BookingSummary::from(&booking);
        self.notifier
            .push_booking_update(&booking.booking_id, summary.clone())?;

        info!(
            "Booking {} created for '{}' with provider '{}' ({:.2}km, {}min, price {})",
            booking.booking_id,
            identity.user_id,
            provider.name,
            booking.distance_km,
            booking.eta_minutes,
            booking.price
        );

        Ok(BookingReceipt {
            booking: summary,
            provider: AssignedProviderSummary {
                id: provider.id,
                name: provider.name,
                rating: provider.rating,
                image_url: provider.image_url,
                distance_km: assignment.distance_km,
                status: "Awaiting provider acceptance".to_string(),
            },
        })
    }

    /// Apply a provider-side action (ACCEPT / REJECT / UPDATE) to a booking
    pub async fn provider_action(
        &self,
        identity: &Identity,
        booking_id: &str,
        action: ProviderAction,
    ) -> Result<BookingSummary> {
        access::require_role(identity, Role::Provider)?;

        let profile = self
            .directory
            .find_by_owner(&identity.user_id)?
            .ok_or_else(|| DispatchError::NotFound {
                entity: "provider profile".to_string(),
            })?;

        let action_name = action.name();
        let (booking, appended_note) = {
            let mut bookings = self.write_bookings()?;
            let booking = bookings
                .get_mut(booking_id)
                .filter(|b| b.provider == profile.id)
                .ok_or_else(Self::booking_not_found)?;

            let mut appended_note = None;
            match &action {
                ProviderAction::Accept { note } => {
                    if booking.status != BookingStatus::Pending {
                        self.metrics.record_invalid_transition(action_name);
                        return Err(Self::invalid_state(booking, "accept"));
                    }

                    booking.status = BookingStatus::Active;
                    if let Some(text) = note.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                        booking.messages.push(ChatMessage {
                            sender_role: crate::types::SenderRole::Provider,
                            sender_id: identity.user_id.clone(),
                            sender_name: profile.name.clone(),
                            text: text.to_string(),
                            sent_at: current_timestamp(),
                        });
                    }
                }
                ProviderAction::Reject => {
                    if booking.status != BookingStatus::Pending {
                        self.metrics.record_invalid_transition(action_name);
                        return Err(Self::invalid_state(booking, "reject"));
                    }

                    booking.status = BookingStatus::Rejected;
                }
                ProviderAction::Update { eta_minutes, note } => {
                    let mut changed = false;

                    if let Some(minutes) = eta_minutes.filter(|m| *m > 0) {
                        booking.eta_minutes = minutes;
                        booking.eta_at = geo::arrival_from_minutes(minutes);
                        changed = true;
                    }

                    if let Some(text) = note.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                        booking.messages.push(ChatMessage {
                            sender_role: crate::types::SenderRole::Provider,
                            sender_id: identity.user_id.clone(),
                            sender_name: profile.name.clone(),
                            text: text.to_string(),
                            sent_at: current_timestamp(),
                        });
                        appended_note = Some(text.to_string());
                        changed = true;
                    }

                    if !changed {
                        return Err(DispatchError::Validation {
                            reason: "nothing to update".to_string(),
                        }
                        .into());
                    }
                }
            }

            booking.updated_at = current_timestamp();
            (booking.clone(), appended_note)
        };

        match &action {
            ProviderAction::Accept { .. } => {
                self.update_stats(|stats| stats.bookings_accepted += 1)?;
                self.metrics.record_transition(action_name, false);

                self.raise(NotificationDraft {
                    recipient: booking.customer.clone(),
                    booking_id: Some(booking.booking_id.clone()),
                    kind: NotificationKind::BookingAccepted,
                    title: "Provider accepted booking".to_string(),
                    body: format!("{} accepted booking {}", profile.name, booking.booking_id),
                    action: None,
                })?;
            }
            ProviderAction::Reject => {
                self.directory.release(profile.id)?;
                self.update_stats(|stats| stats.bookings_rejected += 1)?;
                self.metrics.record_transition(action_name, true);

                self.raise(NotificationDraft {
                    recipient: booking.customer.clone(),
                    booking_id: Some(booking.booking_id.clone()),
                    kind: NotificationKind::BookingRejected,
                    title: "Provider rejected booking".to_string(),
                    body: format!("{} rejected booking {}", profile.name, booking.booking_id),
                    action: Some(ActionHint::Rebook),
                })?;
            }
            ProviderAction::Update { .. } => {
                self.metrics.record_transition(action_name, false);

                self.raise(NotificationDraft {
                    recipient: booking.customer.clone(),
                    booking_id: Some(booking.booking_id.clone()),
                    kind: NotificationKind::BookingUpdated,
                    title: "Provider update".to_string(),
                    body: appended_note.unwrap_or_else(|| {
                        format!("ETA updated to {} minutes", booking.eta_minutes)
                    }),
                    action: None,
                })?;
            }
        }

        let summary = BookingSummary::from(&booking);
        self.notifier
            .push_booking_update(&booking.booking_id, summary.clone())?;

        info!(
            "Provider '{}' applied {} to booking {}",
            profile.name, action_name, booking.booking_id
        );
        Ok(summary)
    }

    /// Cancel a booking; owning customer only, PENDING or ACTIVE only
    pub async fn cancel(&self, identity: &Identity, booking_id: &str) -> Result<BookingSummary> {
        let booking = {
            let mut bookings = self.write_bookings()?;
            let booking = bookings
                .get_mut(booking_id)
                .filter(|b| b.customer == identity.user_id)
                .ok_or_else(Self::booking_not_found)?;

            if !matches!(
                booking.status,
                BookingStatus::Pending | BookingStatus::Active
            ) {
                self.metrics.record_invalid_transition("CANCEL");
                return Err(Self::invalid_state(booking, "cancel"));
            }

            booking.status = BookingStatus::Cancelled;
            booking.updated_at = current_timestamp();
            booking.clone()
        };

        self.directory.release(booking.provider)?;
        self.update_stats(|stats| stats.bookings_cancelled += 1)?;
        self.metrics.record_transition("CANCEL", true);

        if let Some(profile) = self.directory.get(booking.provider)? {
            if let Some(owner) = &profile.owner {
                self.raise(NotificationDraft {
                    recipient: owner.clone(),
                    booking_id: Some(booking.booking_id.clone()),
                    kind: NotificationKind::BookingCancelled,
                    title: "Booking cancelled".to_string(),
                    body: format!("Customer cancelled booking {}", booking.booking_id),
                    action: None,
                })?;
            }
        }

        let summary = BookingSummary::from(&booking);
        self.notifier
            .push_booking_update(&booking.booking_id, summary.clone())?;

        info!("Booking {} cancelled by its customer", booking.booking_id);
        Ok(summary)
    }

    /// Store a rating and review; completes the booking when it was ACTIVE.
    /// The provider is released unconditionally.
    pub async fn rate(
        &self,
        identity: &Identity,
        booking_id: &str,
        rating: u8,
        review: Option<String>,
    ) -> Result<BookingSummary> {
        if !(1..=5).contains(&rating) {
            return Err(DispatchError::Validation {
                reason: "rating must be between 1 and 5".to_string(),
            }
            .into());
        }

        let (booking, was_active) = {
            let mut bookings = self.write_bookings()?;
            let booking = bookings
                .get_mut(booking_id)
                .filter(|b| b.customer == identity.user_id)
                .ok_or_else(Self::booking_not_found)?;

            let was_active = booking.status == BookingStatus::Active;
            booking.rating = Some(rating);
            booking.review = review.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());
            if was_active {
                booking.status = BookingStatus::Completed;
            }
            booking.updated_at = current_timestamp();
            (booking.clone(), was_active)
        };

        // Release is idempotent at the flag level; a booking already
        // terminal before rating still releases cleanly.
        self.directory.release(booking.provider)?;
        if was_active {
            self.update_stats(|stats| stats.bookings_completed += 1)?;
        }
        self.metrics.record_transition("RATE", was_active);

        info!(
            "Booking {} rated {} (status now {})",
            booking.booking_id, rating, booking.status
        );
        Ok(BookingSummary::from(&booking))
    }

    /// Record payment for a booking; owning customer only, once
    pub async fn pay(
        &self,
        identity: &Identity,
        booking_id: &str,
        payment_method: Option<String>,
    ) -> Result<PaymentReceipt> {
        let booking = {
            let mut bookings = self.write_bookings()?;
            let booking = bookings
                .get_mut(booking_id)
                .filter(|b| b.customer == identity.user_id)
                .ok_or_else(Self::booking_not_found)?;

            if booking.payment_status == PaymentStatus::Paid {
                return Err(DispatchError::AlreadyDone {
                    reason: "payment already completed".to_string(),
                }
                .into());
            }

            if let Some(method) = payment_method.filter(|m| !m.trim().is_empty()) {
                booking.payment_method = method;
            }
            booking.payment_status = PaymentStatus::Paid;
            booking.payment_txn_id = Some(generate_txn_id());
            booking.paid_at = Some(current_timestamp());
            booking.updated_at = current_timestamp();
            booking.clone()
        };

        self.update_stats(|stats| stats.payments_recorded += 1)?;
        self.metrics.record_transition("PAY", false);
        self.metrics.booking().payments_total.inc();

        if let Some(profile) = self.directory.get(booking.provider)? {
            if let Some(owner) = &profile.owner {
                self.raise(NotificationDraft {
                    recipient: owner.clone(),
                    booking_id: Some(booking.booking_id.clone()),
                    kind: NotificationKind::PaymentUpdate,
                    title: "Payment completed".to_string(),
                    body: format!("Customer completed payment for {}", booking.booking_id),
                    action: None,
                })?;
            }
        }

        let summary = BookingSummary::from(&booking);
        self.notifier
            .push_booking_update(&booking.booking_id, summary)?;

        info!("Payment recorded for booking {}", booking.booking_id);
        Ok(PaymentReceipt {
            booking_id: booking.booking_id,
            payment_status: booking.payment_status,
            payment_txn_id: booking.payment_txn_id.unwrap_or_default(),
            paid_at: booking.paid_at.unwrap_or_else(current_timestamp),
            payment_method: booking.payment_method,
        })
    }

    /// Append a chat message. Allowed for the owning customer, the assigned
    /// provider, or an admin; everyone else gets an explicit denial.
    pub async fn send_message(
        &self,
        identity: &Identity,
        booking_id: &str,
        text: &str,
    ) -> Result<ChatMessage> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DispatchError::Validation {
                reason: "message text required".to_string(),
            }
            .into());
        }

        let snapshot = self
            .read_bookings()?
            .get(booking_id)
            .cloned()
            .ok_or_else(Self::booking_not_found)?;

        let actor = access::resolve_booking_actor(&snapshot, identity, self.directory.as_ref())?
            .ok_or_else(|| DispatchError::AccessDenied {
                reason: "access denied".to_string(),
            })?;

        let sender_role = match actor {
            BookingActor::AssignedProvider(_) => crate::types::SenderRole::Provider,
            _ => crate::types::SenderRole::Customer,
        };

        let message = ChatMessage {
            sender_role,
            sender_id: identity.user_id.clone(),
            sender_name: identity.name.clone(),
            text: text.to_string(),
            sent_at: current_timestamp(),
        };

        {
            let mut bookings = self.write_bookings()?;
            let booking = bookings
                .get_mut(booking_id)
                .ok_or_else(Self::booking_not_found)?;
            booking.messages.push(message.clone());
            booking.updated_at = current_timestamp();
        }

        self.update_stats(|stats| stats.messages_sent += 1)?;
        self.metrics.booking().messages_total.inc();

        self.notifier
            .push_chat_message(&snapshot.booking_id, message.clone())?;

        let recipient = match sender_role {
            crate::types::SenderRole::Provider => Some(snapshot.customer.clone()),
            crate::types::SenderRole::Customer => self
                .directory
                .get(snapshot.provider)?
                .and_then(|profile| profile.owner),
        };

        if let Some(recipient) = recipient {
            self.raise(NotificationDraft {
                recipient,
                booking_id: Some(snapshot.booking_id.clone()),
                kind: NotificationKind::NewMessage,
                title: "New message".to_string(),
                body: format!("{}: {}", message.sender_name, message.text),
                action: None,
            })?;
        }

        Ok(message)
    }

    /// Full booking view per the access rule; unauthorized callers see
    /// not-found, never forbidden.
    pub async fn booking_detail(
        &self,
        identity: &Identity,
        booking_id: &str,
    ) -> Result<BookingDetail> {
        let booking = self
            .read_bookings()?
            .get(booking_id)
            .cloned()
            .ok_or_else(Self::booking_not_found)?;

        access::resolve_booking_actor(&booking, identity, self.directory.as_ref())?
            .ok_or_else(Self::booking_not_found)?;

        let provider = self
            .directory
            .get(booking.provider)?
            .map(|profile| ProviderSummary::from(&profile));

        Ok(BookingDetail {
            customer: CustomerSummary {
                id: booking.customer.clone(),
                name: booking.customer_name.clone(),
                location: Some(booking.customer_location),
            },
            booking: BookingSummary::from(&booking),
            provider,
        })
    }

    /// The chat log for a booking, in append order
    pub async fn messages(&self, identity: &Identity, booking_id: &str) -> Result<Vec<ChatMessage>> {
        let booking = self
            .read_bookings()?
            .get(booking_id)
            .cloned()
            .ok_or_else(Self::booking_not_found)?;

        access::resolve_booking_actor(&booking, identity, self.directory.as_ref())?
            .ok_or_else(Self::booking_not_found)?;

        Ok(booking.messages)
    }

    /// A customer's booking history, newest first
    pub async fn history(&self, identity: &Identity) -> Result<Vec<HistoryEntry>> {
        let mut own: Vec<Booking> = self
            .read_bookings()?
            .values()
            .filter(|b| b.customer == identity.user_id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut entries = Vec::with_capacity(own.len());
        for booking in own {
            let provider_name = self
                .directory
                .get(booking.provider)?
                .map(|p| p.name)
                .unwrap_or_default();
            entries.push(HistoryEntry {
                booking_id: booking.booking_id,
                service_type: booking.service_type,
                status: booking.status,
                eta_at: booking.eta_at,
                eta_minutes: booking.eta_minutes,
                distance_km: booking.distance_km,
                price: booking.price,
                is_emergency: booking.is_emergency,
                payment_status: booking.payment_status,
                created_at: booking.created_at,
                provider_name,
            });
        }

        Ok(entries)
    }

    /// A provider's own profile and assignment list, newest first
    pub async fn provider_assignments(&self, identity: &Identity) -> Result<ProviderAssignments> {
        access::require_role(identity, Role::Provider)?;

        let profile = self
            .directory
            .find_by_owner(&identity.user_id)?
            .ok_or_else(|| DispatchError::NotFound {
                entity: "provider profile".to_string(),
            })?;

        let mut assigned: Vec<Booking> = self
            .read_bookings()?
            .values()
            .filter(|b| b.provider == profile.id)
            .cloned()
            .collect();
        assigned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let bookings = assigned
            .into_iter()
            .map(|booking| AssignmentEntry {
                customer: CustomerSummary {
                    id: booking.customer.clone(),
                    name: booking.customer_name.clone(),
                    location: Some(booking.customer_location),
                },
                booking_id: booking.booking_id,
                service_type: booking.service_type,
                status: booking.status,
                eta_at: booking.eta_at,
                eta_minutes: booking.eta_minutes,
                distance_km: booking.distance_km,
                price: booking.price,
                is_emergency: booking.is_emergency,
                payment_status: booking.payment_status,
                created_at: booking.created_at,
            })
            .collect();

        Ok(ProviderAssignments { provider: profile, bookings })
    }

    /// Manual availability toggle for the calling provider
    pub async fn set_availability(
        &self,
        identity: &Identity,
        available: bool,
    ) -> Result<ProviderProfile> {
        access::require_role(identity, Role::Provider)?;

        let profile = self
            .directory
            .find_by_owner(&identity.user_id)?
            .ok_or_else(|| DispatchError::NotFound {
                entity: "provider profile".to_string(),
            })?;

        self.directory
            .set_availability(profile.id, available)?
            .ok_or_else(|| {
                DispatchError::NotFound {
                    entity: "provider profile".to_string(),
                }
                .into()
            })
    }

    /// Read-only nearby listing with standard ETA quotes
    pub async fn nearby_providers(
        &self,
        service_type: &str,
        location: Option<crate::types::GeoPoint>,
    ) -> Result<Vec<NearbyProvider>> {
        self.engine
            .rank_nearby(service_type, location, self.nearby_limit)
    }

    /// The caller's notification feed with its unread badge count
    pub async fn notifications(&self, identity: &Identity) -> Result<NotificationFeed> {
        let notifications = self.notifier.feed(&identity.user_id, self.feed_limit)?;
        let unread_count = self.notifier.unread_count(&identity.user_id)?;
        Ok(NotificationFeed {
            notifications,
            unread_count,
        })
    }

    /// Acknowledge one of the caller's notifications
    pub async fn mark_notification_read(&self, identity: &Identity, id: Uuid) -> Result<()> {
        self.notifier
            .mark_read(id, &identity.user_id)?
            .ok_or_else(|| DispatchError::NotFound {
                entity: "notification".to_string(),
            })?;
        Ok(())
    }

    /// Admin-only platform overview
    pub async fn admin_overview(&self, identity: &Identity) -> Result<AdminOverview> {
        access::require_role(identity, Role::Admin)?;

        let bookings = self.read_bookings()?;
        let total_bookings = bookings.len();
        let active_bookings = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Active)
            .count();
        let pending_bookings = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending)
            .count();
        let completed_bookings = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Completed)
            .count();

        let mut recent: Vec<&Booking> = bookings.values().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let recent_bookings = recent
            .into_iter()
            .take(20)
            .map(|booking| crate::types::RecentBooking {
                booking_id: booking.booking_id.clone(),
                service_type: booking.service_type.clone(),
                status: booking.status,
                customer_name: booking.customer_name.clone(),
                created_at: booking.created_at,
            })
            .collect();
        drop(bookings);

        Ok(AdminOverview {
            total_bookings,
            active_bookings,
            pending_bookings,
            completed_bookings,
            total_providers: self.directory.provider_count()?,
            recent_bookings,
        })
    }

    /// Join a booking's real-time channel. Denied subscribers get an
    /// explicit channel-level error, not a silent drop.
    pub async fn join_booking_channel(
        &self,
        identity: &Identity,
        booking_id: &str,
    ) -> Result<broadcast::Receiver<PushEvent>> {
        let denied = || -> anyhow::Error {
            DispatchError::AccessDenied {
                reason: "access denied".to_string(),
            }
            .into()
        };

        let booking = self
            .read_bookings()?
            .get(booking_id)
            .cloned()
            .ok_or_else(denied)?;

        access::resolve_booking_actor(&booking, identity, self.directory.as_ref())?
            .ok_or_else(denied)?;

        self.hub.subscribe_booking(&booking.booking_id)
    }

    /// Subscribe to the caller's own notification channel
    pub fn subscribe_user(&self, identity: &Identity) -> Result<broadcast::Receiver<PushEvent>> {
        self.hub.subscribe_user(&identity.user_id)
    }

    /// Get current manager statistics
    pub async fn get_stats(&self) -> Result<BookingManagerStats> {
        let mut stats = self
            .stats
            .read()
            .map_err(|_| DispatchError::Internal {
                message: "Failed to acquire stats lock".to_string(),
            })?
            .clone();

        let bookings = self.read_bookings()?;
        stats.pending_bookings = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending)
            .count();
        stats.active_bookings = bookings
            .values()
            .filter(|b| b.status == BookingStatus::Active)
            .count();

        Ok(stats)
    }
}
