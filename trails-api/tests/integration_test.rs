use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use trails_api::state::{AppState, AuthConfig};
use trails_api::app;
use trails_core::enrichment::{SimulatedTracker, SimulatedWeather};
use trails_core::identity::{Argon2Hasher, MemoryAccounts};
use trails_catalog::MemoryCatalog;
use trails_draft::MemorySessions;
use trails_ledger::{Ledger, MemoryReservationStore};
use trails_store::app_config::BusinessRules;
use trails_store::RedisClient;

async fn test_app() -> axum::Router {
    let catalog = Arc::new(MemoryCatalog::with_sample_timetable().await);

    let state = AppState {
        accounts: Arc::new(MemoryAccounts::new()),
        hasher: Arc::new(Argon2Hasher),
        trips: catalog.clone(),
        stops: catalog,
        ledger: Arc::new(Ledger::new(Arc::new(MemoryReservationStore::new()))),
        sessions: Arc::new(MemorySessions::new()),
        weather: Arc::new(SimulatedWeather),
        tracker: Arc::new(SimulatedTracker),
        // Never connected in tests; the limiter keys on a peer address that
        // in-process requests do not have.
        redis: Arc::new(RedisClient::new("redis://127.0.0.1:6379").await.unwrap()),
        auth: AuthConfig {
            secret: "integration-test-secret".to_string(),
            expiration: 3600,
        },
        business_rules: BusinessRules {
            draft_ttl_seconds: 1800,
            currency: "INR".to_string(),
            rate_limit_per_minute: 100,
        },
    };

    app(state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn signup(app: &axum::Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/v1/auth/signup",
        None,
        Some(json!({
            "first_name": "Kavlin",
            "last_name": "Sharma",
            "email": email,
            "phone": "9876543210",
            "password": "wanderlust1",
            "confirm_password": "wanderlust1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "signup failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

/// Walk the wizard up to Priced for the given seats on the first
/// Dharampur -> Solan trip, returning that trip's id.
async fn walk_wizard_to_priced(app: &axum::Router, token: &str, seats: &[&str]) -> String {
    let (status, trips) = send(app, "GET", "/v1/trips?from=Dharampur&to=Solan", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let trip_id = trips[0]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        app,
        "POST",
        "/v1/wizard/search",
        Some(token),
        Some(json!({
            "origin": "Dharampur",
            "destination": "Solan",
            "travel_date": "2025-12-01",
            "passengers": seats.len(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        "POST",
        "/v1/wizard/trip",
        Some(token),
        Some(json!({
            "trip_id": trip_id,
            "pickup_stop": "Dharampur Main Bus Stand",
            "dropoff_stop": "Solan Bus Terminal",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        app,
        "POST",
        "/v1/wizard/seats",
        Some(token),
        Some(json!({ "seats": seats })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, "POST", "/v1/wizard/price", Some(token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["step"], "PRICED");

    trip_id
}

#[tokio::test]
async fn test_signup_login_and_duplicate_email() {
    let app = test_app().await;

    signup(&app, "kavlin@example.com").await;

    // Same email again: conflict.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/signup",
        None,
        Some(json!({
            "first_name": "Kavlin",
            "last_name": "Sharma",
            "email": "kavlin@example.com",
            "phone": "9876543210",
            "password": "wanderlust1",
            "confirm_password": "wanderlust1",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": "kavlin@example.com", "password": "wanderlust1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, _) = send(
        &app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "email": "kavlin@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_full_booking_flow_and_commit_race() {
    let app = test_app().await;
    let token_a = signup(&app, "a@example.com").await;
    let token_b = signup(&app, "b@example.com").await;

    // Both visitors price overlapping seats off the same empty seat map.
    let trip_id = walk_wizard_to_priced(&app, &token_a, &["A1", "A2"]).await;
    walk_wizard_to_priced(&app, &token_b, &["A2", "A3"]).await;

    // A commits first and pays 2 x 150.00.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/bookings",
        Some(&token_a),
        Some(json!({ "payment_method": "UPI" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CONFIRMED");
    assert_eq!(body["total_fare"], 30000);
    assert_eq!(body["seats"], json!(["A1", "A2"]));

    // B's commit must observe A's seats and fail; nothing partial persists.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/bookings",
        Some(&token_b),
        Some(json!({ "payment_method": "UPI" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/v1/trips/{}/availability?date=2025-12-01", trip_id);
    let (status, availability) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(availability["seats_taken"], json!(["A1", "A2"]));
    assert_eq!(availability["seats_available"], 38);
    assert_eq!(availability["seat_map"].as_array().unwrap().len(), 40);

    // The losing draft was rewound to seat selection.
    let (status, wizard) = send(&app, "GET", "/v1/wizard", Some(&token_b), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(wizard["step"], "TRIP_SELECTED");

    // B re-picks free seats and gets them.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/wizard/seats",
        Some(&token_b),
        Some(json!({ "seats": ["A3", "A4"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/v1/wizard/price", Some(&token_b), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &app,
        "POST",
        "/v1/bookings",
        Some(&token_b),
        Some(json!({ "payment_method": "CARD" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_booking_requires_authentication() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/v1/bookings",
        None,
        Some(json!({ "payment_method": "UPI" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/v1/bookings", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_cancel_ownership_and_idempotency() {
    let app = test_app().await;
    let token_a = signup(&app, "owner@example.com").await;
    let token_b = signup(&app, "stranger@example.com").await;

    walk_wizard_to_priced(&app, &token_a, &["B1"]).await;
    let (_, booking) = send(
        &app,
        "POST",
        "/v1/bookings",
        Some(&token_a),
        Some(json!({ "payment_method": "UPI" })),
    )
    .await;
    let reservation_id = booking["reservation_id"].as_str().unwrap().to_string();
    let cancel_uri = format!("/v1/bookings/{}/cancel", reservation_id);

    // A stranger cannot cancel it, and the ledger is unchanged.
    let (status, _) = send(&app, "POST", &cancel_uri, Some(&token_b), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, listed) = send(&app, "GET", "/v1/bookings", Some(&token_a), None).await;
    assert_eq!(listed[0]["status"], "CONFIRMED");

    // The owner can, twice, with the same outcome.
    let (status, body) = send(&app, "POST", &cancel_uri, Some(&token_a), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    let (status, body) = send(&app, "POST", &cancel_uri, Some(&token_a), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "CANCELLED");

    // Unknown reservation: 404.
    let missing = format!("/v1/bookings/{}/cancel", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "POST", &missing, Some(&token_a), Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wizard_out_of_order_redirects() {
    let app = test_app().await;
    let token = signup(&app, "wanderer@example.com").await;

    // Jumping straight to seats: no error, a pointer back to the search step.
    let (status, body) = send(
        &app,
        "POST",
        "/v1/wizard/seats",
        Some(&token),
        Some(json!({ "seats": ["A1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect_to"], "SEARCH_ENTERED");
    assert_eq!(body["step"], "EMPTY");

    // Pricing with no seats chosen is a hard validation error.
    let (status, _) = send(
        &app,
        "POST",
        "/v1/wizard/search",
        Some(&token),
        Some(json!({
            "origin": "Dharampur",
            "destination": "Solan",
            "travel_date": "2025-12-01",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", "/v1/wizard/price", Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect_to"], "TRIP_SELECTED");
}

#[tokio::test]
async fn test_trip_detail_availability_and_enrichment() {
    let app = test_app().await;

    let (_, trips) = send(&app, "GET", "/v1/trips?from=Dharampur&to=Solan", None, None).await;
    assert_eq!(trips.as_array().unwrap().len(), 3);
    let trip_id = trips[0]["id"].as_str().unwrap().to_string();

    let (status, detail) = send(&app, "GET", &format!("/v1/trips/{}", trip_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["pickup_stops"].as_array().unwrap().len(), 3);
    assert_eq!(detail["dropoff_stops"].as_array().unwrap().len(), 3);

    // Malformed travel date is a validation error.
    let uri = format!("/v1/trips/{}/availability?date=12-01-2025", trip_id);
    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Enrichment degrades, never errors.
    let (status, position) = send(&app, "GET", &format!("/v1/trips/{}/position", trip_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(position["status"], "LIVE");
    assert!(position["position"]["lat"].as_f64().is_some());

    let (status, conditions) = send(&app, "GET", &format!("/v1/trips/{}/conditions", trip_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conditions["destination"], "Solan");
    assert!(conditions["weather"]["temperature_c"].as_f64().is_some());

    // Unknown trip ids are a 404 everywhere.
    let missing = format!("/v1/trips/{}", uuid::Uuid::new_v4());
    let (status, _) = send(&app, "GET", &missing, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
