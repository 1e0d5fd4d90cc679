use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::dto::booking_dto::{
    CheckinRequest, CheckoutRequest, CreateBookingRequest, QuoteQuery, QuoteResponse,
};
use crate::models::auth::AuthenticatedUser;
use crate::models::booking::Booking;
use crate::services::booking_service::{local_now, BookingService};
use crate::utils::errors::AppResult;

/// Listas diarias del personal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyList {
    Pickups,
    Requests,
    Returns,
}

pub struct BookingController {
    service: Arc<BookingService>,
}

impl BookingController {
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }

    pub async fn create(
        &self,
        user: &AuthenticatedUser,
        request: CreateBookingRequest,
    ) -> AppResult<Booking> {
        info!(
            "📝 {} solicita el vehículo {} ({} - {})",
            user.username, request.vehicle_id, request.pickup_date, request.return_date
        );
        self.service.create(user, request, local_now()).await
    }

    pub async fn quote(&self, query: QuoteQuery) -> AppResult<QuoteResponse> {
        self.service.quote(&query).await
    }

    pub async fn get_by_id(&self, user: &AuthenticatedUser, id: i64) -> AppResult<Booking> {
        self.service.find(user, id).await
    }

    pub async fn confirm(&self, user: &AuthenticatedUser, id: i64) -> AppResult<Booking> {
        self.service.confirm(user, id, local_now()).await
    }

    pub async fn cancel(&self, user: &AuthenticatedUser, id: i64) -> AppResult<Booking> {
        self.service.cancel(user, id, local_now()).await
    }

    pub async fn check_out(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: CheckoutRequest,
    ) -> AppResult<Booking> {
        self.service.check_out(user, id, request, local_now()).await
    }

    pub async fn check_in(
        &self,
        user: &AuthenticatedUser,
        id: i64,
        request: CheckinRequest,
    ) -> AppResult<Booking> {
        self.service.check_in(user, id, request, local_now()).await
    }

    /// Sin fecha, la lista es la de hoy
    pub async fn daily(&self, list: DailyList, date: Option<NaiveDate>) -> AppResult<Vec<Booking>> {
        let date = date.unwrap_or_else(|| local_now().date());
        let bookings = match list {
            DailyList::Pickups => self.service.pickups_for(date).await?,
            DailyList::Requests => self.service.requests_for(date).await?,
            DailyList::Returns => self.service.returns_for(date).await?,
        };
        info!("📋 {:?} del {}: {} reservas", list, date, bookings.len());
        Ok(bookings)
    }

    pub async fn history(
        &self,
        user: &AuthenticatedUser,
        customer_id: i64,
    ) -> AppResult<Vec<Booking>> {
        self.service.history_for(user, customer_id).await
    }
}
