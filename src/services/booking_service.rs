//! Servicio de reservas
//!
//! Orquesta el ciclo de vida contra los repositorios: carga la reserva,
//! aplica la transición pura y la persiste con control de versión. Aquí se
//! aplican también las reglas de acceso por rol.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime};
use tracing::{info, warn};
use validator::Validate;

use crate::dto::booking_dto::{CheckinRequest, CheckoutRequest, CreateBookingRequest, QuoteQuery, QuoteResponse};
use crate::models::audit::AuditEntry;
use crate::models::auth::AuthenticatedUser;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::vehicle::Vehicle;
use crate::repositories::{BookingRepository, VehicleRepository};
use crate::services::booking_lifecycle::{
    self, CheckinCommand, CheckoutCommand, DamageReport, NewBooking, Transition,
};
use crate::services::pricing_service::PricingEngine;
use crate::utils::errors::{forbidden_error, AppError, AppResult, BookingError};

/// Hora local del punto de alquiler (sin zona horaria)
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    pricing: PricingEngine,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        pricing: PricingEngine,
    ) -> Self {
        Self {
            bookings,
            vehicles,
            pricing,
        }
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        request: CreateBookingRequest,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        request.validate()?;

        let customer_id = match (actor.customer_id, request.customer_id) {
            (Some(own), Some(requested)) if !actor.is_staff() && own != requested => {
                return Err(forbidden_error(
                    "create booking",
                    "customers can only book for themselves",
                ))
            }
            (_, Some(requested)) if actor.is_staff() => requested,
            (Some(own), _) => own,
            _ => {
                return Err(AppError::BadRequest(
                    "customerId is required".to_string(),
                ))
            }
        };

        let vehicle = self.vehicle(request.vehicle_id).await?;
        let transition = booking_lifecycle::create(
            NewBooking {
                customer_id,
                vehicle_id: request.vehicle_id,
                pickup_date: request.pickup_date,
                return_date: request.return_date,
                pickup_location: request.pickup_location,
                return_location: request.return_location,
                extras: request.extras,
            },
            &vehicle,
            &self.pricing,
            now,
        )?;

        let audit = AuditEntry::new(&actor.username, transition.action, 0, transition.details, now);
        let booking = self.bookings.insert(&transition.booking, &audit).await?;

        info!(
            "📅 Reserva {} solicitada por {} para {} ({} - {}), total {}",
            booking.id,
            actor.username,
            vehicle.label(),
            booking.pickup_date,
            booking.return_date,
            booking.total_price
        );
        Ok(booking)
    }

    /// Presupuesto sin crear la reserva
    pub async fn quote(&self, query: &QuoteQuery) -> AppResult<QuoteResponse> {
        if query.return_date <= query.pickup_date {
            return Err(BookingError::validation("Return date must be after pickup date").into());
        }
        let vehicle = self.vehicle(query.vehicle_id).await?;
        let price = self.pricing.price(
            query.pickup_date,
            query.return_date,
            vehicle.daily_price,
            &query.extras(),
        );

        Ok(QuoteResponse {
            vehicle_id: vehicle.id,
            daily_price: vehicle.daily_price,
            price,
        })
    }

    pub async fn find(&self, actor: &AuthenticatedUser, id: i64) -> AppResult<Booking> {
        let booking = self.load(id).await?;
        if !actor.can_act_for(booking.customer_id) {
            return Err(forbidden_error("read booking", "booking belongs to another customer"));
        }
        Ok(booking)
    }

    pub async fn confirm(
        &self,
        actor: &AuthenticatedUser,
        id: i64,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        ensure_staff(actor, "confirm booking")?;
        self.apply(actor, id, now, |booking, _| booking_lifecycle::confirm(booking, now))
            .await
    }

    pub async fn cancel(
        &self,
        actor: &AuthenticatedUser,
        id: i64,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        self.apply(actor, id, now, |booking, _| booking_lifecycle::cancel(booking, now))
            .await
    }

    pub async fn check_out(
        &self,
        actor: &AuthenticatedUser,
        id: i64,
        request: CheckoutRequest,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        ensure_staff(actor, "check out booking")?;
        request.validate()?;

        self.apply(actor, id, now, |booking, vehicle| {
            let command = CheckoutCommand {
                mileage: request.mileage.unwrap_or(vehicle.mileage),
                notes: request.notes.clone(),
            };
            booking_lifecycle::check_out(booking, vehicle, command, now)
        })
        .await
    }

    pub async fn check_in(
        &self,
        actor: &AuthenticatedUser,
        id: i64,
        request: CheckinRequest,
        now: NaiveDateTime,
    ) -> AppResult<Booking> {
        ensure_staff(actor, "check in booking")?;
        request.validate()?;

        self.apply(actor, id, now, |booking, _| {
            let command = CheckinCommand {
                mileage: request.mileage,
                damage: DamageReport {
                    present: request.damage_present,
                    notes: request.damage_notes.clone(),
                    cost: request.damage_cost,
                },
                return_time: request.actual_return_time,
            };
            booking_lifecycle::check_in(booking, command, now)
        })
        .await
    }

    /// Entregas confirmadas para un día
    pub async fn pickups_for(&self, date: NaiveDate) -> AppResult<Vec<Booking>> {
        self.bookings
            .find_by_pickup_date(date, BookingStatus::Confirmed)
            .await
    }

    /// Solicitudes pendientes de confirmar con recogida en un día
    pub async fn requests_for(&self, date: NaiveDate) -> AppResult<Vec<Booking>> {
        self.bookings
            .find_by_pickup_date(date, BookingStatus::Requested)
            .await
    }

    /// Devoluciones esperadas para un día
    pub async fn returns_for(&self, date: NaiveDate) -> AppResult<Vec<Booking>> {
        self.bookings
            .find_by_return_date(date, BookingStatus::Confirmed)
            .await
    }

    pub async fn history_for(
        &self,
        actor: &AuthenticatedUser,
        customer_id: i64,
    ) -> AppResult<Vec<Booking>> {
        if !actor.can_act_for(customer_id) {
            return Err(forbidden_error(
                "list bookings",
                "customers can only list their own bookings",
            ));
        }
        self.bookings.find_by_customer(customer_id).await
    }

    pub async fn vehicle(&self, id: i64) -> AppResult<Vehicle> {
        self.vehicles
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookingError::vehicle_not_found(id).into())
    }

    async fn load(&self, id: i64) -> AppResult<Booking> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(id).into())
    }

    /// Carga, transiciona y persiste.
    ///
    /// Si otra escritura ganó la carrera, se recarga la reserva y se vuelve
    /// a evaluar la transición solo para devolver el error específico
    /// ("already checked out", ...). Nunca se reintenta la escritura.
    async fn apply<F>(
        &self,
        actor: &AuthenticatedUser,
        id: i64,
        now: NaiveDateTime,
        step: F,
    ) -> AppResult<Booking>
    where
        F: Fn(&Booking, &Vehicle) -> Result<Transition, BookingError> + Send + Sync,
    {
        let booking = self.load(id).await?;
        if !actor.can_act_for(booking.customer_id) {
            return Err(forbidden_error(
                "modify booking",
                "booking belongs to another customer",
            ));
        }
        let vehicle = self.vehicle(booking.vehicle_id).await?;

        let transition = step(&booking, &vehicle)?;
        let audit = AuditEntry::new(
            &actor.username,
            transition.action,
            booking.id,
            transition.details.clone(),
            now,
        );

        match self
            .bookings
            .commit_transition(
                booking.version,
                &transition.booking,
                transition.vehicle_update.as_ref(),
                &audit,
            )
            .await
        {
            Ok(saved) => {
                info!(
                    "✅ {} reserva {} por {}: {}",
                    audit.action.as_str(),
                    saved.id,
                    actor.username,
                    audit.details
                );
                Ok(saved)
            }
            Err(AppError::Booking(BookingError::Conflict(message))) => {
                warn!(
                    "⚠️ Conflicto al guardar la reserva {}: {}",
                    id, message
                );
                let fresh = self.load(id).await?;
                let vehicle = self.vehicle(fresh.vehicle_id).await?;
                match step(&fresh, &vehicle) {
                    Err(specific) => Err(specific.into()),
                    Ok(_) => Err(BookingError::Conflict(message).into()),
                }
            }
            Err(other) => Err(other),
        }
    }
}

fn ensure_staff(actor: &AuthenticatedUser, operation: &str) -> AppResult<()> {
    if actor.is_staff() {
        Ok(())
    } else {
        Err(forbidden_error(operation, "staff role required"))
    }
}
