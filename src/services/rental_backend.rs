//! Frontera con el backend de reservas
//!
//! Los flujos de entrega y devolución hablan con este trait. Lo implementan
//! el cliente REST (`client::BookingApiClient`) y `LocalBackend`, que llama
//! directamente al `BookingService` del mismo proceso.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::dto::booking_dto::{CheckinRequest, CheckoutRequest};
use crate::models::auth::AuthenticatedUser;
use crate::models::booking::Booking;
use crate::models::vehicle::Vehicle;
use crate::services::booking_service::{local_now, BookingService};
use crate::utils::errors::BookingError;

#[async_trait]
pub trait RentalBackend: Send + Sync {
    async fn fetch_booking(&self, booking_id: i64) -> Result<Booking, BookingError>;

    async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Vehicle, BookingError>;

    async fn pickups_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError>;

    async fn returns_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError>;

    /// Una única escritura; un timeout deja el resultado desconocido
    async fn submit_checkout(
        &self,
        booking_id: i64,
        request: &CheckoutRequest,
    ) -> Result<Booking, BookingError>;

    async fn submit_checkin(
        &self,
        booking_id: i64,
        request: &CheckinRequest,
    ) -> Result<Booking, BookingError>;
}

/// Backend en proceso, con un actor fijo y un reloj opcionalmente fijado
pub struct LocalBackend {
    service: Arc<BookingService>,
    actor: AuthenticatedUser,
    now: Option<NaiveDateTime>,
}

impl LocalBackend {
    pub fn new(service: Arc<BookingService>, actor: AuthenticatedUser) -> Self {
        Self {
            service,
            actor,
            now: None,
        }
    }

    /// Fija la hora usada en las transiciones
    pub fn at(mut self, now: NaiveDateTime) -> Self {
        self.now = Some(now);
        self
    }

    fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(local_now)
    }
}

#[async_trait]
impl RentalBackend for LocalBackend {
    async fn fetch_booking(&self, booking_id: i64) -> Result<Booking, BookingError> {
        Ok(self.service.find(&self.actor, booking_id).await?)
    }

    async fn fetch_vehicle(&self, vehicle_id: i64) -> Result<Vehicle, BookingError> {
        Ok(self.service.vehicle(vehicle_id).await?)
    }

    async fn pickups_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        Ok(self.service.pickups_for(date).await?)
    }

    async fn returns_for(&self, date: NaiveDate) -> Result<Vec<Booking>, BookingError> {
        Ok(self.service.returns_for(date).await?)
    }

    async fn submit_checkout(
        &self,
        booking_id: i64,
        request: &CheckoutRequest,
    ) -> Result<Booking, BookingError> {
        Ok(self
            .service
            .check_out(&self.actor, booking_id, request.clone(), self.now())
            .await?)
    }

    async fn submit_checkin(
        &self,
        booking_id: i64,
        request: &CheckinRequest,
    ) -> Result<Booking, BookingError> {
        Ok(self
            .service
            .check_in(&self.actor, booking_id, request.clone(), self.now())
            .await?)
    }
}
