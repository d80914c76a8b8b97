//! Metrics and monitoring for the instaserve dispatch service
//!
//! This module provides Prometheus metrics collection and the HTTP
//! health/metrics endpoints.

pub mod collector;
pub mod health;

pub use collector::{AssignmentMetrics, BookingMetrics, MetricsCollector, NotificationMetrics};
pub use health::{HealthServer, HealthServerConfig};
