use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Extension, Json, Router,
};
use serde::de::DeserializeOwned;

use crate::controllers::booking_controller::{BookingController, DailyList};
use crate::dto::booking_dto::{
    CheckinRequest, CheckoutRequest, CreateBookingRequest, DateQuery, QuoteQuery, QuoteResponse,
};
use crate::middleware::auth::{auth_middleware, staff_only_middleware};
use crate::models::auth::AuthenticatedUser;
use crate::models::booking::Booking;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_booking_router(state: AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/:id/confirm", put(confirm_booking))
        .route("/:id/checkout", put(check_out_booking))
        .route("/:id/checkin", put(check_in_booking))
        .route("/pickups", get(list_pickups))
        .route("/requests", get(list_requests))
        .route("/returns", get(list_returns))
        .route_layer(from_fn(staff_only_middleware));

    Router::new()
        .route("/", post(create_booking))
        .route("/quote", get(quote_booking))
        .route("/customer/:customer_id", get(customer_history))
        .route("/:id", get(get_booking))
        .route("/:id/cancel", put(cancel_booking))
        .merge(staff)
        .route_layer(from_fn_with_state(state, auth_middleware))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

fn optional_body<T>(payload: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(payload)
        .map_err(|e| AppError::BadRequest(format!("Failed to parse the request body as JSON: {}", e)))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(value)| value)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let controller = BookingController::new(state.bookings.clone());
    let booking = controller.create(&user, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn quote_booking(
    State(state): State<AppState>,
    params: Result<Query<QuoteQuery>, QueryRejection>,
) -> Result<Json<QuoteResponse>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.quote(query(params)?).await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.get_by_id(&user, id).await?))
}

async fn customer_history(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(customer_id): Path<i64>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.history(&user, customer_id).await?))
}

async fn confirm_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.confirm(&user, id).await?))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.cancel(&user, id).await?))
}

/// El cuerpo es opcional: vacío equivale a `{}` y se usa el kilometraje
/// del vehículo. Un cuerpo mal formado es un 400.
async fn check_out_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    payload: Bytes,
) -> Result<Json<Booking>, AppError> {
    let request = optional_body::<CheckoutRequest>(&payload)?;
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.check_out(&user, id, request).await?))
}

async fn check_in_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<i64>,
    payload: Result<Json<CheckinRequest>, JsonRejection>,
) -> Result<Json<Booking>, AppError> {
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.check_in(&user, id, body(payload)?).await?))
}

async fn list_pickups(
    State(state): State<AppState>,
    params: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    daily(state, DailyList::Pickups, params).await
}

async fn list_requests(
    State(state): State<AppState>,
    params: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    daily(state, DailyList::Requests, params).await
}

async fn list_returns(
    State(state): State<AppState>,
    params: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    daily(state, DailyList::Returns, params).await
}

async fn daily(
    state: AppState,
    list: DailyList,
    params: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let date = query(params)?.date;
    let controller = BookingController::new(state.bookings.clone());
    Ok(Json(controller.daily(list, date).await?))
}
