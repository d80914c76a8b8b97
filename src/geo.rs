//! Distance and ETA calculation
//!
//! Pure geodesic distance plus quote-time ETA estimation from a
//! configurable speed and floor policy.

use crate::types::GeoPoint;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance between two points in kilometers.
/// Pure and deterministic; symmetric in its arguments.
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round a distance to two decimals, the precision surfaced to callers
pub fn round_km(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Policy governing ETA quotes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaPolicy {
    /// Assumed provider travel speed
    pub avg_speed_kmh: f64,
    /// Fixed quote for emergency bookings, regardless of distance
    pub emergency_floor_minutes: u32,
    /// Minimum quote for standard bookings
    pub standard_floor_minutes: u32,
}

impl Default for EtaPolicy {
    fn default() -> Self {
        Self {
            avg_speed_kmh: 30.0,
            emergency_floor_minutes: 5,
            standard_floor_minutes: 15,
        }
    }
}

impl EtaPolicy {
    /// Validate policy values
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.avg_speed_kmh <= 0.0 {
            return Err(crate::error::DispatchError::Validation {
                reason: "avg_speed_kmh must be positive".to_string(),
            }
            .into());
        }

        if self.emergency_floor_minutes == 0 || self.standard_floor_minutes == 0 {
            return Err(crate::error::DispatchError::Validation {
                reason: "ETA floors must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Estimate an arrival quote for the given distance.
    ///
    /// Emergency bookings always quote exactly the emergency floor.
    /// Standard bookings quote `max(floor, ceil(distance / speed * 60))`
    /// with no upper cap.
    pub fn estimate(&self, distance_km: f64, is_emergency: bool) -> EtaEstimate {
        let minutes = if is_emergency {
            self.emergency_floor_minutes
        } else {
            let travel_minutes = (distance_km / self.avg_speed_kmh * 60.0).ceil() as u32;
            travel_minutes.max(self.standard_floor_minutes)
        };

        EtaEstimate {
            minutes,
            arrival_at: Utc::now() + Duration::minutes(i64::from(minutes)),
        }
    }
}

/// An ETA quote: relative minutes plus the absolute target timestamp
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtaEstimate {
    pub minutes: u32,
    pub arrival_at: DateTime<Utc>,
}

/// Arrival timestamp for an externally supplied ETA (provider updates)
pub fn arrival_from_minutes(minutes: u32) -> DateTime<Utc> {
    Utc::now() + Duration::minutes(i64::from(minutes))
}
