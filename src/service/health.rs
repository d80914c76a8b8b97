//! Health check reporting
//!
//! This module provides health check functionality for the instaserve
//! dispatch service, including readiness and liveness probes.

use crate::service::app::AppState;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Service version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional error message if unhealthy
    pub message: Option<String>,
    /// Check duration in milliseconds
    pub duration_ms: u64,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStats {
    /// Bookings currently pending acceptance
    pub pending_bookings: usize,
    /// Bookings currently in progress
    pub active_bookings: usize,
    /// Total bookings created since service start
    pub bookings_created: u64,
    /// Total payments recorded since service start
    pub payments_recorded: u64,
    /// Registered providers
    pub providers_registered: usize,
    /// Live real-time channels
    pub live_channels: usize,
    /// Service uptime information
    pub uptime_info: String,
}

impl HealthCheck {
    /// Perform a comprehensive health check of the service
    pub async fn check(app_state: Arc<AppState>) -> Result<Self> {
        let mut checks = Vec::new();
        let mut overall_status = HealthStatus::Healthy;

        let service_check = Self::check_service_running(&app_state).await;
        if service_check.status != HealthStatus::Healthy {
            overall_status = HealthStatus::Unhealthy;
        }
        checks.push(service_check);

        let manager_check = Self::check_booking_manager(&app_state).await;
        if manager_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if manager_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(manager_check);

        let directory_check = Self::check_provider_directory(&app_state).await;
        if directory_check.status == HealthStatus::Unhealthy {
            overall_status = HealthStatus::Unhealthy;
        } else if directory_check.status == HealthStatus::Degraded
            && overall_status == HealthStatus::Healthy
        {
            overall_status = HealthStatus::Degraded;
        }
        checks.push(directory_check);

        let stats = Self::gather_service_stats(&app_state).await;

        Ok(HealthCheck {
            status: overall_status,
            service: app_state.config().service.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if app_state.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - verify service can handle requests
    pub async fn readiness_check(app_state: Arc<AppState>) -> Result<HealthStatus> {
        if !app_state.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        Ok(Self::check_booking_manager(&app_state).await.status)
    }

    async fn check_service_running(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = if app_state.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn check_booking_manager(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.booking_manager().get_stats().await {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => (
                HealthStatus::Degraded,
                Some(format!("Stats check failed: {e}")),
            ),
        };

        ComponentCheck {
            name: "booking_manager".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn check_provider_directory(app_state: &Arc<AppState>) -> ComponentCheck {
        let start = std::time::Instant::now();

        let (status, message) = match app_state.directory().provider_count() {
            Ok(_) => (HealthStatus::Healthy, None),
            Err(e) => (
                HealthStatus::Unhealthy,
                Some(format!("Directory check failed: {e}")),
            ),
        };

        ComponentCheck {
            name: "provider_directory".to_string(),
            status,
            message,
            duration_ms: start.elapsed().as_millis() as u64,
        }
    }

    async fn gather_service_stats(app_state: &Arc<AppState>) -> ServiceStats {
        let manager_stats = match app_state.booking_manager().get_stats().await {
            Ok(stats) => stats,
            Err(e) => {
                debug!("Failed to get manager stats for health check: {}", e);
                Default::default()
            }
        };

        ServiceStats {
            pending_bookings: manager_stats.pending_bookings,
            active_bookings: manager_stats.active_bookings,
            bookings_created: manager_stats.bookings_created,
            payments_recorded: manager_stats.payments_recorded,
            providers_registered: app_state.directory().provider_count().unwrap_or(0),
            live_channels: app_state.hub().channel_count(),
            uptime_info: app_state.uptime_info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_health_check_on_stopped_service() {
        let app_state = Arc::new(AppState::new(AppConfig::default()).await.unwrap());

        let health = HealthCheck::check(app_state.clone()).await.unwrap();
        // Not started yet: the running check fails
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.service, "instaserve");
        assert_eq!(health.checks.len(), 3);

        let liveness = HealthCheck::liveness_check(app_state).await.unwrap();
        assert_eq!(liveness, HealthStatus::Unhealthy);
    }
}
