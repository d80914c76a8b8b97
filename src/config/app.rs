//! Main application configuration
//!
//! This module defines the primary configuration structures for the
//! instaserve dispatch service, including environment variable loading
//! and validation.

use crate::geo::EtaPolicy;
use crate::types::GeoPoint;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub dispatch: DispatchSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for the health/metrics endpoint
    pub health_port: u16,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Dispatch-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Assumed provider travel speed for ETA quotes
    pub avg_speed_kmh: f64,
    /// Fixed ETA quote for emergency bookings
    pub emergency_floor_minutes: u32,
    /// Minimum ETA quote for standard bookings
    pub standard_floor_minutes: u32,
    /// Fallback coordinate used when a request omits its location
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
    /// Maximum entries returned by the nearby-provider listing
    pub nearby_limit: usize,
    /// Maximum entries returned by the notification feed
    pub notification_feed_limit: usize,
    /// Buffered events per real-time channel before slow subscribers lag
    pub channel_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "instaserve".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            shutdown_timeout_seconds: 30,
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            avg_speed_kmh: 30.0,
            emergency_floor_minutes: 5,
            standard_floor_minutes: 15,
            fallback_latitude: 28.6139,
            fallback_longitude: 77.2090,
            nearby_limit: 10,
            notification_feed_limit: 50,
            channel_capacity: 64,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            config.service.health_port = port
                .parse()
                .map_err(|_| anyhow!("Invalid HEALTH_PORT value: {}", port))?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            config.service.shutdown_timeout_seconds = timeout
                .parse()
                .map_err(|_| anyhow!("Invalid SHUTDOWN_TIMEOUT_SECONDS value: {}", timeout))?;
        }

        // Dispatch settings
        if let Ok(speed) = env::var("AVG_SPEED_KMH") {
            config.dispatch.avg_speed_kmh = speed
                .parse()
                .map_err(|_| anyhow!("Invalid AVG_SPEED_KMH value: {}", speed))?;
        }
        if let Ok(floor) = env::var("EMERGENCY_FLOOR_MINUTES") {
            config.dispatch.emergency_floor_minutes = floor
                .parse()
                .map_err(|_| anyhow!("Invalid EMERGENCY_FLOOR_MINUTES value: {}", floor))?;
        }
        if let Ok(floor) = env::var("STANDARD_FLOOR_MINUTES") {
            config.dispatch.standard_floor_minutes = floor
                .parse()
                .map_err(|_| anyhow!("Invalid STANDARD_FLOOR_MINUTES value: {}", floor))?;
        }
        if let Ok(lat) = env::var("FALLBACK_LATITUDE") {
            config.dispatch.fallback_latitude = lat
                .parse()
                .map_err(|_| anyhow!("Invalid FALLBACK_LATITUDE value: {}", lat))?;
        }
        if let Ok(lon) = env::var("FALLBACK_LONGITUDE") {
            config.dispatch.fallback_longitude = lon
                .parse()
                .map_err(|_| anyhow!("Invalid FALLBACK_LONGITUDE value: {}", lon))?;
        }
        if let Ok(limit) = env::var("NEARBY_LIMIT") {
            config.dispatch.nearby_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid NEARBY_LIMIT value: {}", limit))?;
        }
        if let Ok(limit) = env::var("NOTIFICATION_FEED_LIMIT") {
            config.dispatch.notification_feed_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid NOTIFICATION_FEED_LIMIT value: {}", limit))?;
        }
        if let Ok(capacity) = env::var("CHANNEL_CAPACITY") {
            config.dispatch.channel_capacity = capacity
                .parse()
                .map_err(|_| anyhow!("Invalid CHANNEL_CAPACITY value: {}", capacity))?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        validate_config(&config)?;
        Ok(config)
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Fallback coordinate as a GeoPoint
    pub fn fallback_location(&self) -> GeoPoint {
        GeoPoint::new(
            self.dispatch.fallback_latitude,
            self.dispatch.fallback_longitude,
        )
    }

    /// ETA policy derived from the dispatch settings
    pub fn eta_policy(&self) -> EtaPolicy {
        EtaPolicy {
            avg_speed_kmh: self.dispatch.avg_speed_kmh,
            emergency_floor_minutes: self.dispatch.emergency_floor_minutes,
            standard_floor_minutes: self.dispatch.standard_floor_minutes,
        }
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports and timeouts
    if config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }

    // Validate dispatch settings
    config
        .eta_policy()
        .validate()
        .map_err(|e| anyhow!("Invalid ETA policy: {}", e))?;

    if !(-90.0..=90.0).contains(&config.dispatch.fallback_latitude) {
        return Err(anyhow!(
            "Invalid fallback latitude: {}",
            config.dispatch.fallback_latitude
        ));
    }
    if !(-180.0..=180.0).contains(&config.dispatch.fallback_longitude) {
        return Err(anyhow!(
            "Invalid fallback longitude: {}",
            config.dispatch.fallback_longitude
        ));
    }
    if config.dispatch.nearby_limit == 0 {
        return Err(anyhow!("Nearby limit must be greater than 0"));
    }
    if config.dispatch.notification_feed_limit == 0 {
        return Err(anyhow!("Notification feed limit must be greater than 0"));
    }
    if config.dispatch.channel_capacity == 0 {
        return Err(anyhow!("Channel capacity must be greater than 0"));
    }

    Ok(())
}
