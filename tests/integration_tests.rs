//! Integration tests for the instaserve dispatch engine
//!
//! These tests validate the entire system working together, including:
//! - The complete booking lifecycle from assignment to rating
//! - Preferred-provider fallback behavior
//! - Access control across roles
//! - Notification persistence and real-time fan-out

mod fixtures;

use fixtures::{build_system, customer, kind_of, plumbing_request, seed_provider, ORIGIN};
use instaserve::access::Identity;
use instaserve::directory::ProviderDirectory;
use instaserve::types::{
    BookingRequest, BookingStatus, NotificationKind, PaymentStatus, ProviderAction, PushEvent,
};

#[tokio::test]
async fn test_complete_booking_workflow() {
    let system = build_system();
    // Two plumbers, roughly 1.2km and 3.4km from the origin
    let near = seed_provider(
        &system.directory,
        "Ravi",
        Some("prov-user-1"),
        "Plumbing",
        28.6247,
    );
    let far = seed_provider(
        &system.directory,
        "Arjun",
        Some("prov-user-2"),
        "Plumbing",
        28.6445,
    );

    // Step 1: customer books, nearest provider is locked
    let receipt = system
        .manager
        .create_booking(&customer(), plumbing_request())
        .await
        .unwrap();

    assert_eq!(receipt.provider.id, near.id);
    assert_eq!(receipt.booking.status, BookingStatus::Pending);
    assert_eq!(receipt.booking.price, 349);
    assert_eq!(receipt.booking.eta_minutes, 15);
    assert_eq!(receipt.provider.status, "Awaiting provider acceptance");
    assert!(!system.directory.get(near.id).unwrap().unwrap().availability);
    assert!(system.directory.get(far.id).unwrap().unwrap().availability);

    let booking_id = receipt.booking.booking_id.clone();
    let provider_identity = Identity::provider("prov-user-1", "Ravi");

    // Step 2: provider accepts
    let summary = system
        .manager
        .provider_action(
            &provider_identity,
            &booking_id,
            ProviderAction::Accept { note: None },
        )
        .await
        .unwrap();
    assert_eq!(summary.status, BookingStatus::Active);

    // Step 3: customer pays via UPI
    let payment = system
        .manager
        .pay(&customer(), &booking_id, Some("UPI".to_string()))
        .await
        .unwrap();
    assert_eq!(payment.payment_status, PaymentStatus::Paid);
    assert!(payment.payment_txn_id.starts_with("TXN"));

    // Step 4: customer rates 5 stars, booking completes, provider freed
    let summary = system
        .manager
        .rate(&customer(), &booking_id, 5, Some("Quick and tidy".to_string()))
        .await
        .unwrap();
    assert_eq!(summary.status, BookingStatus::Completed);
    assert!(system.directory.get(near.id).unwrap().unwrap().availability);

    // The customer's history reflects the whole story
    let history = system.manager.history(&customer()).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BookingStatus::Completed);
    assert_eq!(history[0].payment_status, PaymentStatus::Paid);
    assert_eq!(history[0].provider_name, "Ravi");
}

#[tokio::test]
async fn test_preferred_provider_fallback_is_silent() {
    let system = build_system();
    let near = seed_provider(&system.directory, "Near", None, "Plumbing", 28.6247);
    let preferred = seed_provider(&system.directory, "Preferred", None, "Plumbing", 28.6445);

    // The preferred provider goes offline before the request lands
    system
        .directory
        .set_availability(preferred.id, false)
        .unwrap();

    let receipt = system
        .manager
        .create_booking(
            &customer(),
            BookingRequest {
                preferred_provider: Some(preferred.id),
                ..plumbing_request()
            },
        )
        .await
        .unwrap();

    // No error surfaced; the next nearest available match was assigned
    assert_eq!(receipt.provider.id, near.id);
}

#[tokio::test]
async fn test_emergency_booking_pricing_and_eta() {
    let system = build_system();
    // Far enough that a standard quote would exceed the emergency floor
    seed_provider(&system.directory, "Ravi", None, "Plumbing", 28.70);

    let receipt = system
        .manager
        .create_booking(
            &customer(),
            BookingRequest {
                is_emergency: true,
                ..plumbing_request()
            },
        )
        .await
        .unwrap();

    // 349 * 1.5 rounded, and the emergency floor regardless of distance
    assert_eq!(receipt.booking.price, 524);
    assert_eq!(receipt.booking.eta_minutes, 5);
    assert!(receipt.booking.is_emergency);
}

#[tokio::test]
async fn test_unknown_service_type_uses_default_price() {
    let system = build_system();
    seed_provider(&system.directory, "Odd Jobs", None, "Gardening", 28.6247);

    let receipt = system
        .manager
        .create_booking(
            &customer(),
            BookingRequest {
                service_type: "Gardening".to_string(),
                ..plumbing_request()
            },
        )
        .await
        .unwrap();

    assert_eq!(receipt.booking.price, 299);
}

#[tokio::test]
async fn test_access_control_across_roles() {
    let system = build_system();
    seed_provider(
        &system.directory,
        "Ravi",
        Some("prov-user-1"),
        "Plumbing",
        28.6247,
    );
    seed_provider(
        &system.directory,
        "Arjun",
        Some("prov-user-2"),
        "Plumbing",
        28.6445,
    );

    let receipt = system
        .manager
        .create_booking(&customer(), plumbing_request())
        .await
        .unwrap();
    let booking_id = receipt.booking.booking_id.clone();

    // The assigned provider reads the booking
    let detail = system
        .manager
        .booking_detail(&Identity::provider("prov-user-1", "Ravi"), &booking_id)
        .await
        .unwrap();
    assert_eq!(detail.customer.name, "Asha");

    // A different provider with a perfectly valid token is told not-found
    let err = system
        .manager
        .booking_detail(&Identity::provider("prov-user-2", "Arjun"), &booking_id)
        .await
        .unwrap_err();
    assert_eq!(kind_of(&err), "NOT_FOUND");

    // Another customer as well
    let err = system
        .manager
        .messages(&Identity::customer("cust-9", "Vik"), &booking_id)
        .await
        .unwrap_err();
    assert_eq!(kind_of(&err), "NOT_FOUND");

    // An admin sees everything
    let overview = system
        .manager
        .admin_overview(&Identity::admin("admin-1", "Ops"))
        .await
        .unwrap();
    assert_eq!(overview.total_bookings, 1);
    assert_eq!(overview.recent_bookings[0].booking_id, booking_id);
}

#[tokio::test]
async fn test_realtime_channel_carries_full_booking_payload() {
    let system = build_system();
    seed_provider(
        &system.directory,
        "Ravi",
        Some("prov-user-1"),
        "Plumbing",
        28.6247,
    );

    let receipt = system
        .manager
        .create_booking(&customer(), plumbing_request())
        .await
        .unwrap();
    let booking_id = receipt.booking.booking_id.clone();

    let mut rx = system
        .manager
        .join_booking_channel(&customer(), &booking_id)
        .await
        .unwrap();

    system
        .manager
        .provider_action(
            &Identity::provider("prov-user-1", "Ravi"),
            &booking_id,
            ProviderAction::Update {
                eta_minutes: Some(25),
                note: None,
            },
        )
        .await
        .unwrap();

    match rx.recv().await.unwrap() {
        PushEvent::BookingUpdate { booking, .. } => {
            // The payload is the full updated booking, not a diff
            assert_eq!(booking.eta_minutes, 25);
            assert_eq!(booking.status, BookingStatus::Pending);
            assert_eq!(booking.price, 349);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_notification_flow_for_both_parties() {
    let system = build_system();
    seed_provider(
        &system.directory,
        "Ravi",
        Some("prov-user-1"),
        "Plumbing",
        28.6247,
    );

    let receipt = system
        .manager
        .create_booking(&customer(), plumbing_request())
        .await
        .unwrap();
    let booking_id = receipt.booking.booking_id.clone();
    let provider_identity = Identity::provider("prov-user-1", "Ravi");

    system
        .manager
        .provider_action(&provider_identity, &booking_id, ProviderAction::Reject)
        .await
        .unwrap();

    // The customer now holds a creation notice and a rejection notice
    let feed = system.manager.notifications(&customer()).await.unwrap();
    assert_eq!(feed.unread_count, 2);
    let kinds: Vec<NotificationKind> = feed.notifications.iter().map(|n| n.kind).collect();
    assert!(kinds.contains(&NotificationKind::BookingRejected));
    assert!(kinds.contains(&NotificationKind::BookingCreated));

    // Acknowledging one drops the badge count
    system
        .manager
        .mark_notification_read(&customer(), feed.notifications[0].id)
        .await
        .unwrap();
    let feed = system.manager.notifications(&customer()).await.unwrap();
    assert_eq!(feed.unread_count, 1);
}

#[tokio::test]
async fn test_nearby_listing_is_read_only() {
    let system = build_system();
    seed_provider(&system.directory, "Near", None, "Cleaning", 28.6247);
    seed_provider(&system.directory, "Far", None, "Cleaning", 28.70);

    let nearby = system
        .manager
        .nearby_providers("Cleaning", Some(ORIGIN))
        .await
        .unwrap();

    assert_eq!(nearby.len(), 2);
    assert_eq!(nearby[0].name, "Near");
    assert!(nearby[0].distance_km < nearby[1].distance_km);

    // Listing locked nobody
    for entry in &nearby {
        assert!(entry.availability);
    }
}
