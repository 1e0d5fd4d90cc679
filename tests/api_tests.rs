use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Days, Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use rental_booking::config::{EnvironmentConfig, StorageBackend};
use rental_booking::models::auth::AuthenticatedUser;
use rental_booking::models::booking::{Booking, BookingStatus};
use rental_booking::repositories::InMemoryRepository;
use rental_booking::services::pricing_service::DEFAULT_TAX_RATE;
use rental_booking::utils::jwt::{generate_token, JwtConfig};
use rental_booking::{create_router, AppState};

const SECRET: &str = "test-secret";
const BMW: i64 = 2;

fn test_config() -> EnvironmentConfig {
    EnvironmentConfig {
        environment: "test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_expiration: 3600,
        cors_origins: vec![],
        storage: StorageBackend::Memory,
        database_url: None,
        database_max_connections: 1,
        tax_rate: DEFAULT_TAX_RATE,
    }
}

fn create_test_app() -> Router {
    create_router(AppState::in_memory(
        test_config(),
        InMemoryRepository::with_demo_fleet(),
    ))
}

fn token_for(user: &AuthenticatedUser) -> String {
    let config = JwtConfig {
        secret: SECRET.to_string(),
        expiration: 3600,
    };
    generate_token(user, &config).unwrap()
}

fn customer_token() -> String {
    token_for(&AuthenticatedUser::customer("anna", 4))
}

fn staff_token() -> String {
    token_for(&AuthenticatedUser::staff("tom"))
}

fn in_days(days: u64) -> NaiveDate {
    Local::now().date_naive() + Days::new(days)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn booking_body(pickup: NaiveDate, ret: NaiveDate) -> Value {
    json!({
        "vehicleId": BMW,
        "pickupDate": pickup,
        "returnDate": ret,
        "pickupLocation": "München",
        "returnLocation": "München"
    })
}

async fn create_booking(app: &Router, pickup: NaiveDate, ret: NaiveDate) -> Booking {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/bookings",
        Some(&customer_token()),
        Some(booking_body(pickup, ret)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    serde_json::from_value(body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_requests_without_token_are_rejected() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings",
        None,
        Some(booking_body(in_days(10), in_days(12))),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_customer_creates_priced_booking() {
    let app = create_test_app();
    let booking = create_booking(&app, in_days(10), in_days(12)).await;

    assert_eq!(booking.status, BookingStatus::Requested);
    assert_eq!(booking.customer_id, 4);
    assert_eq!(booking.vehicle_id, BMW);
    // 3 días x 60 + 13 % de impuesto
    assert_eq!(booking.total_price, Decimal::new(20340, 2));
    assert_eq!(booking.version, 1);
}

#[tokio::test]
async fn test_quote_itemizes_the_price() {
    let app = create_test_app();
    let uri = format!(
        "/api/bookings/quote?vehicleId={}&pickupDate={}&returnDate={}&insurance=true",
        BMW,
        in_days(10),
        in_days(12)
    );
    let (status, body) = send(&app, Method::GET, &uri, Some(&customer_token()), None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["days"], 3);
    let total: Decimal = serde_json::from_value(body["total"].clone()).unwrap();
    assert_eq!(total, Decimal::new(23730, 2));
}

#[tokio::test]
async fn test_overlapping_booking_is_a_conflict() {
    let app = create_test_app();
    create_booking(&app, in_days(10), in_days(12)).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&customer_token()),
        Some(booking_body(in_days(12), in_days(14))),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_customer_cannot_confirm() {
    let app = create_test_app();
    let booking = create_booking(&app, in_days(10), in_days(12)).await;

    let uri = format!("/api/bookings/{}/confirm", booking.id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&customer_token()), None).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_customer_cancels_own_booking() {
    let app = create_test_app();
    let booking = create_booking(&app, in_days(10), in_days(12)).await;

    let uri = format!("/api/bookings/{}/cancel", booking.id);
    let (status, body) = send(&app, Method::PUT, &uri, Some(&customer_token()), None).await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "CANCELLED");
    assert!(!body["cancellationDate"].is_null());
}

#[tokio::test]
async fn test_other_customers_history_is_forbidden() {
    let app = create_test_app();
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/bookings/customer/5",
        Some(&customer_token()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/bookings/customer/5",
        Some(&staff_token()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_handover_and_return_over_http() {
    let app = create_test_app();
    let staff = staff_token();
    let booking = create_booking(&app, in_days(10), in_days(12)).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/bookings/{}/confirm", booking.id),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let uri = format!("/api/bookings/pickups?date={}", in_days(10));
    let (status, body) = send(&app, Method::GET, &uri, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    // Sin cuerpo: kilometraje del vehículo
    let checkout = format!("/api/bookings/{}/checkout", booking.id);
    let (status, body) = send(&app, Method::PUT, &checkout, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let handed_over: Booking = serde_json::from_value(body).unwrap();
    assert_eq!(handed_over.checkout_mileage, Some(Decimal::from(50000)));

    let (status, body) = send(&app, Method::PUT, &checkout, Some(&staff), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Booking has already been checked out");

    let checkin = format!("/api/bookings/{}/checkin", booking.id);
    let (status, body) = send(
        &app,
        Method::PUT,
        &checkin,
        Some(&staff),
        Some(json!({ "mileage": 49000, "damagePresent": false })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Return mileage must be at least 50000");

    let (status, body) = send(
        &app,
        Method::PUT,
        &checkin,
        Some(&staff),
        Some(json!({ "mileage": 50500, "damagePresent": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let returned: Booking = serde_json::from_value(body).unwrap();
    assert_eq!(returned.status, BookingStatus::Completed);
    assert_eq!(returned.return_mileage, Some(Decimal::from(50500)));
    assert_eq!(returned.total_price, booking.total_price);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/vehicles/{}", BMW),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_malformed_body_is_a_bad_request() {
    let app = create_test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&customer_token()),
        Some(json!({ "vehicleId": "not-a-number" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_malformed_checkout_body_leaves_booking_untouched() {
    let app = create_test_app();
    let staff = staff_token();
    let booking = create_booking(&app, in_days(10), in_days(12)).await;
    let confirm = format!("/api/bookings/{}/confirm", booking.id);
    let (status, _) = send(&app, Method::PUT, &confirm, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    let checkout = format!("/api/bookings/{}/checkout", booking.id);
    let (status, body) = send(
        &app,
        Method::PUT,
        &checkout,
        Some(&staff),
        Some(json!({ "notes": 12345, "mileage": "abc" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let uri = format!("/api/bookings/{}", booking.id);
    let (status, body) = send(&app, Method::GET, &uri, Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["checkoutTime"], Value::Null);
    assert_eq!(body["status"], "CONFIRMED");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/vehicles/{}", BMW),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "AVAILABLE");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_test_app();
    let (status, body) = send(&app, Method::GET, "/api/nothing", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}
