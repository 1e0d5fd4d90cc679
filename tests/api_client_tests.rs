//! El cliente REST contra el router real servido por TCP

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Days, Duration, Local, NaiveDate};
use rust_decimal::Decimal;
use tokio::net::TcpListener;

use rental_booking::client::{BookingApiClient, Session, SessionContext};
use rental_booking::config::{EnvironmentConfig, StorageBackend};
use rental_booking::dto::booking_dto::{CheckoutRequest, CreateBookingRequest, QuoteQuery};
use rental_booking::models::auth::{AuthenticatedUser, UserRole};
use rental_booking::models::booking::{BookingStatus, Extras};
use rental_booking::models::vehicle::VehicleStatus;
use rental_booking::repositories::InMemoryRepository;
use rental_booking::services::booking_lifecycle::BookingPhase;
use rental_booking::services::pricing_service::DEFAULT_TAX_RATE;
use rental_booking::services::{CheckinForm, CheckinWorkflow, CheckoutWorkflow};
use rental_booking::utils::errors::{BookingError, TransportError};
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

/// Levanta la API en un puerto libre y devuelve la URL base
async fn spawn_server() -> String {
    let app = create_router(AppState::in_memory(
        test_config(),
        InMemoryRepository::with_demo_fleet(),
    ));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api", addr)
}

async fn client_for(
    base_url: &str,
    user: &AuthenticatedUser,
) -> (Arc<BookingApiClient>, Arc<SessionContext>) {
    let config = JwtConfig {
        secret: SECRET.to_string(),
        expiration: 3600,
    };
    let token = generate_token(user, &config).unwrap();
    let session = Arc::new(SessionContext::new());
    session
        .init(Session::new(token, user.username.clone(), user.role, Duration::hours(1)))
        .await;
    let client = BookingApiClient::new(base_url, session.clone()).unwrap();
    (Arc::new(client), session)
}

fn in_days(days: u64) -> NaiveDate {
    Local::now().date_naive() + Days::new(days)
}

fn booking_request(pickup: NaiveDate, ret: NaiveDate) -> CreateBookingRequest {
    CreateBookingRequest {
        customer_id: None,
        vehicle_id: BMW,
        pickup_date: pickup,
        return_date: ret,
        pickup_location: "München".to_string(),
        return_location: "München".to_string(),
        extras: Extras::none(),
    }
}

#[tokio::test]
async fn workflows_run_over_http_against_the_router() {
    let base_url = spawn_server().await;
    let (customer, _) = client_for(&base_url, &AuthenticatedUser::customer("anna", 4)).await;
    let (staff, _) = client_for(&base_url, &AuthenticatedUser::staff("tom")).await;

    let booking = customer
        .create_booking(&booking_request(in_days(10), in_days(12)))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Requested);
    assert_eq!(booking.total_price, Decimal::new(20340, 2));

    let confirmed = staff.confirm(booking.id).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);

    let checkout = CheckoutWorkflow::new(staff.clone());
    let pending = checkout.pending_handovers(in_days(10)).await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].license_plate, "M-RC-2002");
    assert!(pending[0].can_check_out);

    let handed_over = checkout.check_out(booking.id, None).await.unwrap();
    assert_eq!(BookingPhase::of(&handed_over), BookingPhase::CheckedOut);
    assert_eq!(handed_over.checkout_mileage, Some(Decimal::from(50000)));
    assert_eq!(staff.vehicle(BMW).await.unwrap().status, VehicleStatus::Rented);

    // El 409 del servidor llega como Conflict con su mensaje
    assert_eq!(
        staff.check_out(booking.id, &CheckoutRequest::default()).await,
        Err(BookingError::conflict("Booking has already been checked out"))
    );

    let checkin = CheckinWorkflow::new(staff.clone());
    let err = checkin
        .check_in(
            booking.id,
            CheckinForm {
                mileage: 49000.0,
                ..CheckinForm::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::validation("Return mileage must be at least 50000")
    );

    let returned = checkin
        .check_in(
            booking.id,
            CheckinForm {
                mileage: 50500.0,
                ..CheckinForm::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(returned.status, BookingStatus::Completed);
    assert_eq!(returned.return_mileage, Some(Decimal::from(50500)));
    assert_eq!(returned.total_price, booking.total_price);

    let vehicle = staff.vehicle(BMW).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Available);
    assert_eq!(vehicle.mileage, Decimal::from(50500));
}

#[tokio::test]
async fn customer_calls_map_server_errors() {
    let base_url = spawn_server().await;
    let (customer, _) = client_for(&base_url, &AuthenticatedUser::customer("anna", 4)).await;

    let quote = customer
        .quote(&QuoteQuery {
            vehicle_id: BMW,
            pickup_date: in_days(20),
            return_date: in_days(22),
            insurance: false,
            additional_driver: false,
            child_seat: false,
        })
        .await
        .unwrap();
    assert_eq!(quote.price.days, 3);
    assert_eq!(quote.price.total, Decimal::new(20340, 2));

    let booking = customer
        .create_booking(&booking_request(in_days(20), in_days(22)))
        .await
        .unwrap();

    assert!(matches!(
        customer
            .create_booking(&booking_request(in_days(21), in_days(23)))
            .await,
        Err(BookingError::Conflict(_))
    ));
    assert_eq!(
        customer.confirm(booking.id).await,
        Err(BookingError::Transport(TransportError::Forbidden))
    );
    assert!(matches!(
        customer.get_booking(999).await,
        Err(BookingError::NotFound(_))
    ));

    let cancelled = customer.cancel(booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);

    let history = customer.customer_bookings(4).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn rejected_token_tears_the_session_down() {
    let base_url = spawn_server().await;
    let session = Arc::new(SessionContext::new());
    session
        .init(Session::new(
            "not-a-jwt",
            "tom",
            UserRole::Employee,
            Duration::hours(1),
        ))
        .await;
    let client = BookingApiClient::new(&base_url, session.clone()).unwrap();

    assert_eq!(
        client.get_booking(1).await,
        Err(BookingError::Transport(TransportError::Unauthorized))
    );
    assert!(session.current().await.is_none());

    assert_eq!(
        client.get_booking(1).await,
        Err(BookingError::Transport(TransportError::Unauthorized))
    );
}
