//! Test fixtures shared across integration tests

use instaserve::access::Identity;
use instaserve::assignment::AssignmentEngine;
use instaserve::booking::BookingManager;
use instaserve::catalog::ServiceCatalog;
use instaserve::directory::{InMemoryProviderDirectory, ProviderDirectory};
use instaserve::geo::EtaPolicy;
use instaserve::notify::{ChannelHub, InMemoryNotificationStore, Notifier};
use instaserve::types::{BookingRequest, GeoPoint, ProviderProfile};
use instaserve::utils::generate_provider_id;
use std::sync::Arc;

/// Connaught Place, the default request origin for tests
pub const ORIGIN: GeoPoint = GeoPoint {
    latitude: 28.6139,
    longitude: 77.2090,
};

/// A fully wired in-memory system under test
pub struct TestSystem {
    pub manager: BookingManager,
    pub directory: Arc<InMemoryProviderDirectory>,
    pub hub: Arc<ChannelHub>,
}

/// Build a complete system with an empty provider directory
pub fn build_system() -> TestSystem {
    let directory = Arc::new(InMemoryProviderDirectory::new());
    let catalog = Arc::new(ServiceCatalog::standard());
    let hub = Arc::new(ChannelHub::new(32));
    let notifier = Arc::new(Notifier::new(
        Arc::new(InMemoryNotificationStore::new()),
        hub.clone(),
    ));
    let engine = Arc::new(AssignmentEngine::new(
        directory.clone(),
        catalog.clone(),
        EtaPolicy::default(),
        ORIGIN,
    ));
    let manager = BookingManager::new(directory.clone(), engine, catalog, notifier, hub.clone());

    TestSystem {
        manager,
        directory,
        hub,
    }
}

/// Register a provider at an offset north of the origin.
/// One degree of latitude is roughly 111km, so 0.0108 ~= 1.2km.
pub fn seed_provider(
    directory: &InMemoryProviderDirectory,
    name: &str,
    owner: Option<&str>,
    service_type: &str,
    latitude: f64,
) -> ProviderProfile {
    let profile = ProviderProfile {
        id: generate_provider_id(),
        owner: owner.map(str::to_string),
        name: name.to_string(),
        service_type: service_type.to_string(),
        rating: 4.6,
        availability: true,
        location: GeoPoint::new(latitude, 77.2090),
        image_url: "https://placehold.co/120x120".to_string(),
    };
    directory.insert(profile.clone()).unwrap();
    profile
}

/// The standard test customer
pub fn customer() -> Identity {
    Identity::customer("cust-1", "Asha")
}

/// A plumbing request at the origin
pub fn plumbing_request() -> BookingRequest {
    BookingRequest {
        service_type: "Plumbing".to_string(),
        location: Some(ORIGIN),
        is_emergency: false,
        payment_method: None,
        preferred_provider: None,
    }
}

/// The machine-checkable kind of a dispatch failure
pub fn kind_of(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<instaserve::DispatchError>()
        .expect("expected a DispatchError")
        .kind()
}
