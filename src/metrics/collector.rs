//! Metrics collection using Prometheus

use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::Duration;

/// Main metrics collector for the dispatch service
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    booking_metrics: BookingMetrics,
    assignment_metrics: AssignmentMetrics,
    notification_metrics: NotificationMetrics,
}

/// Booking lifecycle metrics
#[derive(Clone)]
pub struct BookingMetrics {
    /// Bookings created, labelled by service type and emergency flag
    pub bookings_created_total: IntCounterVec,

    /// Lifecycle transitions applied, labelled by action
    pub transitions_total: IntCounterVec,

    /// Transitions rejected by a precondition, labelled by action
    pub invalid_transitions_total: IntCounterVec,

    /// Bookings currently in a non-terminal status
    pub open_bookings: IntGauge,

    /// Payments recorded
    pub payments_total: IntCounter,

    /// Chat messages appended
    pub messages_total: IntCounter,
}

/// Assignment engine metrics
#[derive(Clone)]
pub struct AssignmentMetrics {
    /// Assignment attempts, labelled by outcome
    pub attempts_total: IntCounterVec,

    /// Assignment latency
    pub assignment_duration: Histogram,
}

/// Notification fan-out metrics
#[derive(Clone)]
pub struct NotificationMetrics {
    /// Notifications persisted, labelled by kind
    pub notifications_total: IntCounterVec,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let booking_metrics = BookingMetrics::new(&registry)?;
        let assignment_metrics = AssignmentMetrics::new(&registry)?;
        let notification_metrics = NotificationMetrics::new(&registry)?;

        Ok(Self {
            registry,
            booking_metrics,
            assignment_metrics,
            notification_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get booking metrics
    pub fn booking(&self) -> &BookingMetrics {
        &self.booking_metrics
    }

    /// Get assignment metrics
    pub fn assignment(&self) -> &AssignmentMetrics {
        &self.assignment_metrics
    }

    /// Get notification metrics
    pub fn notification(&self) -> &NotificationMetrics {
        &self.notification_metrics
    }

    /// Record a created booking
    pub fn record_booking_created(&self, service_type: &str, is_emergency: bool) {
        let emergency = if is_emergency { "emergency" } else { "standard" };
        self.booking_metrics
            .bookings_created_total
            .with_label_values(&[service_type, emergency])
            .inc();
        self.booking_metrics.open_bookings.inc();
    }

    /// Record an applied lifecycle transition
    pub fn record_transition(&self, action: &str, closes_booking: bool) {
        self.booking_metrics
            .transitions_total
            .with_label_values(&[action])
            .inc();
        if closes_booking {
            self.booking_metrics.open_bookings.dec();
        }
    }

    /// Record a transition refused by its precondition
    pub fn record_invalid_transition(&self, action: &str) {
        self.booking_metrics
            .invalid_transitions_total
            .with_label_values(&[action])
            .inc();
    }

    /// Record an assignment attempt and its latency
    pub fn record_assignment(&self, outcome: &str, duration: Duration) {
        self.assignment_metrics
            .attempts_total
            .with_label_values(&[outcome])
            .inc();
        self.assignment_metrics
            .assignment_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a persisted notification
    pub fn record_notification(&self, kind: &str) {
        self.notification_metrics
            .notifications_total
            .with_label_values(&[kind])
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("default metrics collector")
    }
}

impl BookingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let bookings_created_total = IntCounterVec::new(
            Opts::new("bookings_created_total", "Total bookings created"),
            &["service_type", "priority"],
        )?;
        registry.register(Box::new(bookings_created_total.clone()))?;

        let transitions_total = IntCounterVec::new(
            Opts::new("booking_transitions_total", "Lifecycle transitions applied"),
            &["action"],
        )?;
        registry.register(Box::new(transitions_total.clone()))?;

        let invalid_transitions_total = IntCounterVec::new(
            Opts::new(
                "booking_invalid_transitions_total",
                "Transitions rejected by a precondition",
            ),
            &["action"],
        )?;
        registry.register(Box::new(invalid_transitions_total.clone()))?;

        let open_bookings = IntGauge::new(
            "open_bookings",
            "Bookings currently in a non-terminal status",
        )?;
        registry.register(Box::new(open_bookings.clone()))?;

        let payments_total = IntCounter::new("payments_total", "Payments recorded")?;
        registry.register(Box::new(payments_total.clone()))?;

        let messages_total = IntCounter::new("messages_total", "Chat messages appended")?;
        registry.register(Box::new(messages_total.clone()))?;

        Ok(Self {
            bookings_created_total,
            transitions_total,
            invalid_transitions_total,
            open_bookings,
            payments_total,
            messages_total,
        })
    }
}

impl AssignmentMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let attempts_total = IntCounterVec::new(
            Opts::new("assignment_attempts_total", "Assignment attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(attempts_total.clone()))?;

        let assignment_duration = Histogram::with_opts(
            HistogramOpts::new("assignment_duration_seconds", "Assignment latency").buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )?;
        registry.register(Box::new(assignment_duration.clone()))?;

        Ok(Self {
            attempts_total,
            assignment_duration,
        })
    }
}

impl NotificationMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications persisted"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_total.clone()))?;

        Ok(Self {
            notifications_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_registers_metric_families() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_booking_created("Plumbing", false);
        collector.record_transition("ACCEPT", false);
        collector.record_assignment("success", Duration::from_millis(3));
        collector.record_notification("BOOKING_ASSIGNED");

        let families = collector.registry().gather();
        let names: Vec<_> = families.iter().map(|f| f.get_name().to_string()).collect();

        assert!(names.iter().any(|n| n.contains("bookings_created")));
        assert!(names.iter().any(|n| n.contains("assignment_attempts")));
        assert!(names.iter().any(|n| n.contains("notifications_total")));
    }

    #[test]
    fn test_open_bookings_gauge_tracks_lifecycle() {
        let collector = MetricsCollector::new().unwrap();
        collector.record_booking_created("Cleaning", true);
        collector.record_booking_created("Cleaning", false);
        assert_eq!(collector.booking().open_bookings.get(), 2);

        collector.record_transition("CANCEL", true);
        assert_eq!(collector.booking().open_bookings.get(), 1);

        // Non-closing transitions leave the gauge alone
        collector.record_transition("ACCEPT", false);
        assert_eq!(collector.booking().open_bookings.get(), 1);
    }
}
