//! Assignment engine implementation
//!
//! Given a request, the engine snapshots the available candidate pool,
//! ranks it by distance, and attempts the availability lock on each
//! candidate in order until one succeeds. At most one provider ends up
//! locked per call; a failed call locks nothing.

use crate::catalog::ServiceCatalog;
use crate::directory::ProviderDirectory;
use crate::error::{DispatchError, Result};
use crate::geo::{self, EtaPolicy};
use crate::types::{GeoPoint, NearbyProvider, ProviderId, ProviderProfile};
use std::sync::Arc;
use tracing::{debug, info};

/// A request for provider assignment
#[derive(Debug, Clone)]
pub struct AssignmentRequest {
    pub service_type: String,
    /// Defaults to the engine's fallback coordinate when omitted
    pub location: Option<GeoPoint>,
    /// Customer-specified provider to try before nearest-available matching
    pub preferred_provider: Option<ProviderId>,
}

/// A successful assignment: the locked provider and its distance
#[derive(Debug, Clone)]
pub struct Assignment {
    pub provider: ProviderProfile,
    pub distance_km: f64,
}

/// The assignment engine
pub struct AssignmentEngine {
    directory: Arc<dyn ProviderDirectory>,
    catalog: Arc<ServiceCatalog>,
    eta_policy: EtaPolicy,
    fallback_location: GeoPoint,
}

impl AssignmentEngine {
    /// Create a new assignment engine
    pub fn new(
        directory: Arc<dyn ProviderDirectory>,
        catalog: Arc<ServiceCatalog>,
        eta_policy: EtaPolicy,
        fallback_location: GeoPoint,
    ) -> Self {
        Self {
            directory,
            catalog,
            eta_policy,
            fallback_location,
        }
    }

    /// The coordinate used when a request omits its location
    pub fn fallback_location(&self) -> GeoPoint {
        self.fallback_location
    }

    /// Find and lock exactly one available provider for the request.
    ///
    /// A preferred provider that is unavailable, lost a race, or offers a
    /// different service falls back silently to auto-assignment; that is
    /// not an error to the caller.
    pub fn assign(&self, request: &AssignmentRequest) -> Result<Assignment> {
        if request.service_type.trim().is_empty() {
            return Err(DispatchError::Validation {
                reason: "serviceType is required".to_string(),
            }
            .into());
        }

        let location = request.location.unwrap_or(self.fallback_location);
        let service_types = self.catalog.resolve_aliases(&request.service_type);

        if let Some(preferred_id) = request.preferred_provider {
            if let Some(provider) = self
                .directory
                .lock_if_available(preferred_id, Some(&service_types))?
            {
                let distance_km = geo::round_km(geo::distance_km(location, provider.location));
                info!(
                    "Assigned preferred provider '{}' at {:.2}km for {}",
                    provider.name, distance_km, request.service_type
                );
                return Ok(Assignment {
                    provider,
                    distance_km,
                });
            }

            debug!(
                "Preferred provider {} not available, falling back to auto-assign",
                preferred_id
            );
        }

        let candidates = self.directory.find_available(&service_types)?;
        if candidates.is_empty() {
            return Err(DispatchError::ProviderContention {
                reason: "no providers available".to_string(),
            }
            .into());
        }

        // Rank ascending by distance; the sort is stable, so equal
        // distances keep registration order.
        let mut ranked: Vec<(ProviderProfile, f64)> = candidates
            .into_iter()
            .map(|provider| {
                let distance = geo::distance_km(location, provider.location);
                (provider, distance)
            })
            .collect();
        ranked.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        // A candidate may have been locked by a competing request between
        // the snapshot read and our lock attempt; try the next one.
        for (candidate, distance) in ranked {
            if let Some(provider) = self.directory.lock_if_available(candidate.id, None)? {
                let distance_km = geo::round_km(distance);
                info!(
                    "Assigned provider '{}' at {:.2}km for {}",
                    provider.name, distance_km, request.service_type
                );
                return Ok(Assignment {
                    provider,
                    distance_km,
                });
            }

            debug!("Candidate {} lost the lock race, trying next", candidate.id);
        }

        Err(DispatchError::ProviderContention {
            reason: "providers became unavailable".to_string(),
        }
        .into())
    }

    /// Rank available providers for a service around a location, with a
    /// standard (non-emergency) ETA quote per entry. Read-only; locks
    /// nothing.
    pub fn rank_nearby(
        &self,
        service_type: &str,
        location: Option<GeoPoint>,
        limit: usize,
    ) -> Result<Vec<NearbyProvider>> {
        if service_type.trim().is_empty() {
            return Err(DispatchError::Validation {
                reason: "serviceType is required".to_string(),
            }
            .into());
        }

        let location = location.unwrap_or(self.fallback_location);
        let service_types = self.catalog.resolve_aliases(service_type);

        let candidates = self.directory.find_available(&service_types)?;
        if candidates.is_empty() {
            return Err(DispatchError::ProviderContention {
                reason: "no providers available for this service".to_string(),
            }
            .into());
        }

        let mut nearby: Vec<NearbyProvider> = candidates
            .into_iter()
            .map(|provider| {
                let distance = geo::distance_km(location, provider.location);
                let eta = self.eta_policy.estimate(distance, false);
                NearbyProvider {
                    id: provider.id,
                    name: provider.name,
                    service_type: provider.service_type,
                    rating: provider.rating,
                    image_url: provider.image_url,
                    location: provider.location,
                    distance_km: geo::round_km(distance),
                    eta_minutes: eta.minutes,
                    availability: provider.availability,
                }
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        nearby.truncate(limit);

        Ok(nearby)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryProviderDirectory;
    use crate::types::ProviderProfile;
    use crate::utils::generate_provider_id;

    const ORIGIN: GeoPoint = GeoPoint {
        latitude: 28.6139,
        longitude: 77.2090,
    };

    fn profile_at(name: &str, service_type: &str, latitude: f64, longitude: f64) -> ProviderProfile {
        ProviderProfile {
            id: generate_provider_id(),
            owner: None,
            name: name.to_string(),
            service_type: service_type.to_string(),
            rating: 4.6,
            availability: true,
            location: GeoPoint::new(latitude, longitude),
            image_url: "https://placehold.co/120x120".to_string(),
        }
    }

    fn test_engine(directory: Arc<InMemoryProviderDirectory>) -> AssignmentEngine {
        AssignmentEngine::new(
            directory,
            Arc::new(ServiceCatalog::standard()),
            EtaPolicy::default(),
            ORIGIN,
        )
    }

    #[test]
    fn test_empty_service_type_fails_validation() {
        let engine = test_engine(Arc::new(InMemoryProviderDirectory::new()));
        let err = engine
            .assign(&AssignmentRequest {
                service_type: "  ".to_string(),
                location: None,
                preferred_provider: None,
            })
            .unwrap_err();

        let dispatch = err.downcast_ref::<DispatchError>().unwrap();
        assert_eq!(dispatch.kind(), "VALIDATION");
    }

    #[test]
    fn test_empty_pool_fails_contention() {
        let engine = test_engine(Arc::new(InMemoryProviderDirectory::new()));
        let err = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: None,
                preferred_provider: None,
            })
            .unwrap_err();

        let dispatch = err.downcast_ref::<DispatchError>().unwrap();
        assert_eq!(dispatch.kind(), "RESOURCE_CONTENTION");
    }

    #[test]
    fn test_nearest_provider_wins() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        // Roughly 1.2km and 3.4km north of the origin
        let near = profile_at("Near", "Plumbing", 28.6247, 77.2090);
        let far = profile_at("Far", "Plumbing", 28.6445, 77.2090);
        directory.insert(far).unwrap();
        directory.insert(near.clone()).unwrap();

        let engine = test_engine(directory.clone());
        let assignment = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: Some(ORIGIN),
                preferred_provider: None,
            })
            .unwrap();

        assert_eq!(assignment.provider.id, near.id);
        assert!(!assignment.provider.availability);
        assert!(assignment.distance_km > 1.0 && assignment.distance_km < 1.5);

        // The loser is still available
        let remaining = directory
            .find_available(&["Plumbing".to_string(), "Plumber".to_string()])
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "Far");
    }

    #[test]
    fn test_alias_pool_is_shared() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        // Registered under the sibling label
        directory
            .insert(profile_at("Ravi", "Plumber", 28.62, 77.21))
            .unwrap();

        let engine = test_engine(directory);
        let assignment = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: Some(ORIGIN),
                preferred_provider: None,
            })
            .unwrap();
        assert_eq!(assignment.provider.service_type, "Plumber");
    }

    #[test]
    fn test_preferred_provider_assigned_when_available() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        let near = profile_at("Near", "Plumbing", 28.6247, 77.2090);
        let preferred = profile_at("Preferred", "Plumbing", 28.6445, 77.2090);
        directory.insert(near).unwrap();
        directory.insert(preferred.clone()).unwrap();

        let engine = test_engine(directory);
        let assignment = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: Some(ORIGIN),
                preferred_provider: Some(preferred.id),
            })
            .unwrap();

        // Preferred wins even though another provider is nearer
        assert_eq!(assignment.provider.id, preferred.id);
    }

    #[test]
    fn test_unavailable_preferred_falls_back_silently() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        let preferred = ProviderProfile {
            availability: false,
            ..profile_at("Busy", "Plumbing", 28.6445, 77.2090)
        };
        let fallback = profile_at("Fallback", "Plumbing", 28.6247, 77.2090);
        directory.insert(preferred.clone()).unwrap();
        directory.insert(fallback.clone()).unwrap();

        let engine = test_engine(directory);
        let assignment = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: Some(ORIGIN),
                preferred_provider: Some(preferred.id),
            })
            .unwrap();

        assert_eq!(assignment.provider.id, fallback.id);
    }

    #[test]
    fn test_wrong_type_preferred_falls_back() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        let electrician = profile_at("Meera", "Electric", 28.6247, 77.2090);
        let plumber = profile_at("Ravi", "Plumbing", 28.6445, 77.2090);
        directory.insert(electrician.clone()).unwrap();
        directory.insert(plumber.clone()).unwrap();

        let engine = test_engine(directory.clone());
        let assignment = engine
            .assign(&AssignmentRequest {
                service_type: "Plumbing".to_string(),
                location: Some(ORIGIN),
                preferred_provider: Some(electrician.id),
            })
            .unwrap();

        assert_eq!(assignment.provider.id, plumber.id);
        // The mismatched preferred provider was not touched
        assert!(directory.get(electrician.id).unwrap().unwrap().availability);
    }

    #[test]
    fn test_rank_nearby_orders_and_truncates() {
        let directory = Arc::new(InMemoryProviderDirectory::new());
        directory
            .insert(profile_at("Far", "Cleaning", 28.70, 77.2090))
            .unwrap();
        directory
            .insert(profile_at("Near", "Cleaning", 28.6247, 77.2090))
            .unwrap();
        directory
            .insert(profile_at("Mid", "Cleaning", 28.6445, 77.2090))
            .unwrap();

        let engine = test_engine(directory);
        let nearby = engine.rank_nearby("Cleaning", Some(ORIGIN), 2).unwrap();

        assert_eq!(nearby.len(), 2);
        assert_eq!(nearby[0].name, "Near");
        assert_eq!(nearby[1].name, "Mid");
        assert!(nearby[0].distance_km <= nearby[1].distance_km);
        // Short trips quote the standard floor
        assert_eq!(nearby[0].eta_minutes, 15);
    }
}
