//! Performance benchmarks for distance ranking and assignment

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use instaserve::assignment::{AssignmentEngine, AssignmentRequest};
use instaserve::catalog::ServiceCatalog;
use instaserve::directory::{InMemoryProviderDirectory, ProviderDirectory};
use instaserve::geo::{self, EtaPolicy};
use instaserve::types::{GeoPoint, ProviderProfile};
use instaserve::utils::generate_provider_id;
use std::sync::Arc;

const ORIGIN: GeoPoint = GeoPoint {
    latitude: 28.6139,
    longitude: 77.2090,
};

fn seeded_directory(count: usize) -> Arc<InMemoryProviderDirectory> {
    let directory = Arc::new(InMemoryProviderDirectory::new());
    for i in 0..count {
        let offset = (i as f64 + 1.0) * 0.002;
        directory
            .insert(ProviderProfile {
                id: generate_provider_id(),
                owner: None,
                name: format!("provider_{i}"),
                service_type: "Plumbing".to_string(),
                rating: 4.6,
                availability: true,
                location: GeoPoint::new(ORIGIN.latitude + offset, ORIGIN.longitude),
                image_url: "https://placehold.co/120x120".to_string(),
            })
            .unwrap();
    }
    directory
}

fn create_bench_engine(directory: Arc<InMemoryProviderDirectory>) -> AssignmentEngine {
    AssignmentEngine::new(
        directory,
        Arc::new(ServiceCatalog::standard()),
        EtaPolicy::default(),
        ORIGIN,
    )
}

fn bench_haversine(c: &mut Criterion) {
    let mumbai = GeoPoint::new(19.0760, 72.8777);

    c.bench_function("haversine_distance", |b| {
        b.iter(|| black_box(geo::distance_km(black_box(ORIGIN), black_box(mumbai))))
    });
}

fn bench_eta_estimation(c: &mut Criterion) {
    let policy = EtaPolicy::default();

    c.bench_function("eta_estimate", |b| {
        b.iter(|| black_box(policy.estimate(black_box(7.3), false)))
    });
}

fn bench_assignment_over_pool(c: &mut Criterion) {
    let directory = seeded_directory(100);
    let engine = create_bench_engine(directory.clone());
    let request = AssignmentRequest {
        service_type: "Plumbing".to_string(),
        location: Some(ORIGIN),
        preferred_provider: None,
    };

    c.bench_function("assign_from_100_providers", |b| {
        b.iter(|| {
            let assignment = engine.assign(black_box(&request)).unwrap();
            // Release so the next iteration sees a full pool again
            directory.release(assignment.provider.id).unwrap();
            black_box(assignment.distance_km)
        })
    });
}

fn bench_nearby_ranking(c: &mut Criterion) {
    let directory = seeded_directory(100);
    let engine = create_bench_engine(directory);

    c.bench_function("rank_nearby_100_providers", |b| {
        b.iter(|| black_box(engine.rank_nearby("Plumbing", Some(ORIGIN), 10).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_haversine,
    bench_eta_estimation,
    bench_assignment_over_pool,
    bench_nearby_ranking
);
criterion_main!(benches);
