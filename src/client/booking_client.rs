use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::client::session::SessionContext;
use crate::dto::booking_dto::{
    CheckinRequest, CheckoutRequest, CreateBookingRequest, QuoteQuery, QuoteResponse,
};
use crate::models::booking::Booking;
use crate::models::vehicle::Vehicle;
use crate::services::rental_backend::RentalBackend;
use crate::utils::errors::{BookingError, ErrorResponse, TransportError};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cliente HTTP para la API de reservas
pub struct BookingApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl BookingApiClient {
    /// `base_url` apunta a la raíz de la API, p. ej. `http://localhost:8080/api`
    pub fn new(base_url: impl Into<String>, session: Arc<SessionContext>) -> Result<Self, BookingError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub async fn create_booking(&self, request: &CreateBookingRequest) -> Result<Booking, BookingError> {
        self.write(Method::POST, "/bookings", Some(request)).await
    }

    pub async fn get_booking(&self, id: i64) -> Result<Booking, BookingError> {
        self.read(&format!("/bookings/{}", id), &[]).await
    }

    pub async fn quote(&self, query: &QuoteQuery) -> Result<QuoteResponse, BookingError> {
        let params = [
            ("vehicleId", query.vehicle_id.to_string()),
            ("pickupDate", query.pickup_date.to_string()),
            ("returnDate", query.return_date.to_string()),
            ("insurance", query.insurance.to_string()),
            ("additionalDriver", query.additional_driver.to_string()),
            ("childSeat", query.child_seat.to_string()),
        ];
        self.read("/bookings/quote", &params).await
    }

    pub async fn confirm(&self, id: i64) -> Result<Booking, BookingError> {
        self.write::<(), _>(Method::PUT, &format!("/bookings/{}/confirm", id), None)
            .await
    }

    pub async fn cancel(&self, id: i64) -> Result<Booking, BookingError> {
        self.write::<(), _>(Method::PUT, &format!("/bookings/{}/cancel", id), None)
            .await
    }

    pub async fn check_out(&self, id: i64, request: &CheckoutRequest) -> Result<Booking, BookingError> {
        self.write(Method::PUT, &format!("/bookings/{}/checkout", id), Some(request))
            .await
    }

    pub async fn check_in(&self, id: i64, request: &CheckinRequest) -> Result<Booking, BookingError> {
        self.write(Method::PUT, &format!("/bookings/{}/checkin", id), Some(request))
            .await
    }

    pub async fn pickups(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        self.read("/bookings/pickups", &[("date", date.to_string())]).await
    }

    pub async fn requests(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        self.read("/bookings/requests", &[("date", date.to_string())]).await
    }

    pub async fn returns(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        self.read("/bookings/returns", &[("date", date.to_string())]).await
    }

    pub async fn customer_bookings(&self, customer_id: i64) -> Result<Vec<Booking>, BookingError> {
        self.read(&format!("/bookings/customer/{}", customer_id), &[]).await
    }

    pub async fn vehicle(&self, id: i64) -> Result<Vehicle, BookingError> {
        self.read(&format!("/vehicles/{}", id), &[]).await
    }

    /// GET con un único reintento ante fallos transitorios
    async fn read<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, BookingError> {
        let url = format!("{}{}", self.base_url, path);
        match self.execute(self.http.get(&url).query(params)).await {
            Err(BookingError::Transport(e)) if e.is_retryable() => {
                warn!("🔄 GET {} falló ({}), reintentando una vez", path, e);
                self.execute(self.http.get(&url).query(params)).await
            }
            other => other,
        }
    }

    /// Las escrituras no se reintentan: tras un timeout el resultado es
    /// desconocido y hay que refrescar la reserva
    async fn write<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, BookingError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.execute(request).await
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BookingError> {
        let session = self
            .session
            .current()
            .await
            .ok_or(TransportError::Unauthorized)?;

        let response = request
            .bearer_auth(&session.token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        debug!("📡 {} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| TransportError::Decode(e.to_string()).into());
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.session.teardown().await;
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_error_response(status.as_u16(), &body))
    }
}

fn transport_error(e: reqwest::Error) -> BookingError {
    if e.is_timeout() {
        TransportError::Timeout.into()
    } else if e.is_decode() {
        TransportError::Decode(e.to_string()).into()
    } else {
        TransportError::Network(e.to_string()).into()
    }
}

/// Traduce una respuesta de error de la API a `BookingError`.
///
/// El campo `code` del cuerpo manda; sin él se decide por el status.
pub fn map_error_response(status: u16, body: &str) -> BookingError {
    let parsed = serde_json::from_str::<ErrorResponse>(body).ok();

    let message = match &parsed {
        Some(response) if !response.message.is_empty() => response.message.clone(),
        _ if !body.trim().is_empty() => body.trim().to_string(),
        _ => format!("Request failed with status {}", status),
    };

    if let Some(error) = parsed
        .as_ref()
        .and_then(|r| r.code.as_deref())
        .and_then(|code| BookingError::from_code(code, message.clone()))
    {
        return error;
    }

    match status {
        400 => BookingError::Validation(message),
        404 => BookingError::NotFound(message),
        409 => BookingError::Conflict(message),
        401 => TransportError::Unauthorized.into(),
        403 => TransportError::Forbidden.into(),
        _ => TransportError::Server { status, message }.into(),
    }
}

#[async_trait]
impl RentalBackend for BookingApiClient {
    async fn fetch_booking(&self, booking_id: i64) -> Result<Booking, BookingError> {
        self.get_booking(booking_id).await
    }

    async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Vehicle, BookingError> {
        self.vehicle(vehicle_id).await
    }

    async fn pickups_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        self.pickups(date).await
    }

    async fn returns_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        self.returns(date).await
    }

    async fn submit_checkout(
        &self,
        booking_id: i64,
        request: &CheckoutRequest,
    ) -> Result<Booking, BookingError> {
        self.check_out(booking_id, request).await
    }

    async fn submit_checkin(
        &self,
        booking_id: i64,
        request: &CheckinRequest,
    ) -> Result<Booking, BookingError> {
        self.check_in(booking_id, request).await
    }
}
