//! Full booking lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the lifecycle
//! manager over real HTTP through `UreqTransport`. Validates that request
//! building, error normalization and local-state reconciliation work
//! end-to-end with the actual server.

use booking_core::{
    ApiError, BookingDraft, BookingManager, BookingStatus, DepartureTime, UreqTransport,
};
use chrono::{Duration, NaiveDate, Utc};

/// Boot the mock server on a random port; returns its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Drafts must not be in the past, so tests book a month out.
fn travel_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(30)
}

#[test]
fn booking_lifecycle() {
    let base = start_server();
    let mut mgr = BookingManager::new(&base, UreqTransport::new());

    // Step 1: reference data for the search form.
    let districts = mgr.districts().unwrap();
    assert!(districts.contains(&"Dhaka".to_string()));
    assert!(districts.contains(&"Sylhet".to_string()));
    let providers = mgr.providers().unwrap();
    assert!(providers.contains(&"Hanif".to_string()));

    // Step 2: search with a price cap narrows to the Hanif route.
    let routes = mgr.routes("Dhaka", "Sylhet", Some(700)).unwrap();
    assert_eq!(routes.len(), 1);
    let route = &routes[0];
    assert_eq!(route.provider, "Hanif");
    assert_eq!(route.dropping_point, "Sylhet Bus Stand");
    assert_eq!(route.price, 650);

    // Step 3: create. The separators in the typed phone number are gone by
    // the time the server sees it.
    let draft = BookingDraft::from_route(
        route,
        "Rahim Uddin",
        "017 1234-5678",
        travel_date(),
        DepartureTime::Eight,
    );
    let created = mgr.create(&draft).unwrap();
    assert_eq!(created.status, BookingStatus::Confirmed);
    assert_eq!(created.name, draft.name);
    assert_eq!(created.phone, "01712345678");
    assert_eq!(created.bus_provider, draft.bus_provider);
    assert_eq!(created.price, draft.price);
    assert_eq!(created.travel_date, draft.travel_date);
    assert_eq!(created.travel_time, draft.travel_time);
    assert_eq!(mgr.bookings().len(), 1);

    // Step 4: a cold phone lookup round-trips the same booking.
    let listed = mgr.search_by_phone("01712345678").unwrap().to_vec();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], created);

    // Step 5: cancel through the composite-key fallback path; the manager
    // re-fetches, and the view shows the flip, never a stale "confirmed".
    let key = created.cancellation_key();
    mgr.cancel_by_key(&key).unwrap();
    assert_eq!(mgr.bookings().len(), 1);
    assert_eq!(mgr.bookings()[0].status, BookingStatus::Cancelled);

    // Step 6: the same key resolves nothing active anymore.
    let err = mgr.cancel_by_key(&key).unwrap_err();
    assert!(matches!(err, ApiError::Remote { status: 404, .. }));
    assert_eq!(err.to_string(), "no active booking matches the given details");

    // Step 7: id-based cancellation of the flipped booking reports too.
    let cancelled = mgr.bookings()[0].clone();
    let err = mgr.cancel(&cancelled).unwrap_err();
    assert!(matches!(err, ApiError::Remote { status: 400, .. }));
    assert_eq!(mgr.last_error(), Some("booking already cancelled"));
    assert!(!mgr.is_loading());
}

#[test]
fn seat_exhaustion_surfaces_the_server_message() {
    let base = start_server();
    let mut mgr = BookingManager::new(&base, UreqTransport::new());

    // Single-seat seeded departure.
    let routes = mgr.routes("Dhaka", "Cox's Bazar", None).unwrap();
    assert_eq!(routes.len(), 1);
    let draft = BookingDraft::from_route(
        &routes[0],
        "Rahim Uddin",
        "01712345678",
        travel_date(),
        DepartureTime::TenPm,
    );
    mgr.create(&draft).unwrap();

    let mut second = draft.clone();
    second.name = "Karim Uddin".to_string();
    second.phone = "01898765432".to_string();
    let err = mgr.create(&second).unwrap_err();

    assert!(matches!(err, ApiError::Remote { status: 500, .. }));
    assert_eq!(err.to_string(), "no seats available");
    assert_eq!(mgr.last_error(), Some("no seats available"));
    assert_eq!(mgr.bookings().len(), 1);
}

#[test]
fn phone_views_do_not_leak_between_lookups() {
    let base = start_server();
    let mut mgr = BookingManager::new(&base, UreqTransport::new());

    let routes = mgr.routes("Dhaka", "Sylhet", None).unwrap();
    for (name, phone) in [("Rahim Uddin", "01712345678"), ("Karim Uddin", "01898765432")] {
        let draft = BookingDraft::from_route(
            &routes[0],
            name,
            phone,
            travel_date(),
            DepartureTime::Noon,
        );
        mgr.create(&draft).unwrap();
    }

    mgr.search_by_phone("01712345678").unwrap();
    assert_eq!(mgr.bookings().len(), 1);
    assert_eq!(mgr.bookings()[0].name, "Rahim Uddin");

    mgr.search_by_phone("01898765432").unwrap();
    assert_eq!(mgr.bookings().len(), 1);
    assert_eq!(mgr.bookings()[0].name, "Karim Uddin");
}

#[test]
fn free_text_answer_feeds_a_booking() {
    let base = start_server();
    let mut mgr = BookingManager::new(&base, UreqTransport::new());

    let answer = mgr.ask("Which buses go from Dhaka to Sylhet?").unwrap();
    assert_eq!(answer.query_type, "route_search");
    let suggested = answer.suggested_routes();
    assert!(!suggested.is_empty());

    let draft = BookingDraft::from_route(
        &suggested[0],
        "Rahim Uddin",
        "01712345678",
        travel_date(),
        DepartureTime::Eight,
    );
    let created = mgr.create(&draft).unwrap();
    assert_eq!(created.status, BookingStatus::Confirmed);
    assert_eq!(created.from_district, "Dhaka");
    assert_eq!(created.to_district, "Sylhet");
}

#[test]
fn unreachable_server_is_a_network_error() {
    // Nothing listens on the discard port.
    let mut mgr = BookingManager::new("http://127.0.0.1:9", UreqTransport::new());
    let err = mgr.search_by_phone("01712345678").unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
    assert!(!mgr.is_loading());
    assert!(mgr.bookings().is_empty());
}
