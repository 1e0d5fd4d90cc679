//! Flujo de entrega (check-out)
//!
//! El personal elige una reserva confirmada del día, escribe las notas de
//! estado del vehículo y confirma. El kilometraje no se teclea: se lee del
//! registro del vehículo.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, warn};

use crate::dto::booking_dto::CheckoutRequest;
use crate::models::booking::Booking;
use crate::services::booking_lifecycle::{self, BookingPhase, LifecycleEvent, MAX_NOTES_LENGTH};
use crate::services::inventory_sync::enrich_mileage;
use crate::services::rental_backend::RentalBackend;
use crate::utils::errors::BookingError;

/// Fila de la lista de entregas del día
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoverItem {
    pub booking: Booking,
    pub license_plate: String,
    pub phase: BookingPhase,
    /// Falso en cuanto se observa la entrega registrada
    pub can_check_out: bool,
}

pub struct CheckoutWorkflow {
    backend: Arc<dyn RentalBackend>,
}

impl CheckoutWorkflow {
    pub fn new(backend: Arc<dyn RentalBackend>) -> Self {
        Self { backend }
    }

    pub async fn pending_handovers(&self, date: NaiveDate) -> Result<Vec<HandoverItem>, BookingError> {
        let bookings = self.backend.pickups_for(date).await?;
        let bookings = enrich_mileage(self.backend.as_ref(), bookings).await;

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let booking = booking.normalize();
                let phase = BookingPhase::of(&booking);
                HandoverItem {
                    license_plate: booking.vehicle.license_plate.normalized().to_string(),
                    can_check_out: phase == BookingPhase::Confirmed,
                    phase,
                    booking,
                }
            })
            .collect())
    }

    pub async fn check_out(
        &self,
        booking_id: i64,
        notes: Option<String>,
    ) -> Result<Booking, BookingError> {
        let booking = self.backend.fetch_booking(booking_id).await?.normalize();
        booking_lifecycle::transition(BookingPhase::of(&booking), LifecycleEvent::CheckOut)?;

        if notes
            .as_deref()
            .is_some_and(|n| n.trim().chars().count() > MAX_NOTES_LENGTH)
        {
            return Err(BookingError::validation(format!(
                "Checkout notes must not exceed {} characters",
                MAX_NOTES_LENGTH
            )));
        }

        let mileage = self.current_mileage(&booking).await?;
        let request = CheckoutRequest {
            mileage: Some(mileage),
            notes,
        };

        let saved = self.backend.submit_checkout(booking_id, &request).await?;
        info!(
            "🔑 Entrega registrada para la reserva {} ({} km)",
            saved.id,
            mileage.normalize()
        );
        Ok(saved.normalize())
    }

    /// Kilometraje de registro del vehículo; si la lectura falla se usa el
    /// snapshot de la reserva
    async fn current_mileage(&self, booking: &Booking) -> Result<Decimal, BookingError> {
        let mileage = match self.backend.fetch_vehicle(booking.vehicle_id).await {
            Ok(vehicle) => Some(vehicle.mileage),
            Err(BookingError::Transport(e)) if e.is_auth_failure() => {
                return Err(BookingError::Transport(e));
            }
            Err(e) => {
                warn!(
                    "⚠️ Vehículo {} no disponible, se usa el snapshot de la reserva: {}",
                    booking.vehicle_id, e
                );
                booking.vehicle.mileage
            }
        };

        match mileage {
            Some(m) if m > Decimal::ZERO => Ok(m),
            _ => Err(BookingError::validation(format!(
                "Mileage snapshot missing for vehicle {}",
                booking.vehicle_id
            ))),
        }
    }
}
