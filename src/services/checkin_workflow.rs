//! Flujo de devolución (check-in)
//!
//! El personal introduce el kilometraje de llegada, la evaluación de daños
//! y, si hace falta, la hora real de devolución. Todo lo que se puede
//! validar localmente se valida antes de enviar nada al backend.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use tracing::{info, warn};

use crate::dto::booking_dto::CheckinRequest;
use crate::models::booking::Booking;
use crate::services::booking_lifecycle::{self, BookingPhase, LifecycleEvent, MAX_NOTES_LENGTH};
use crate::services::inventory_sync::enrich_mileage;
use crate::services::rental_backend::RentalBackend;
use crate::utils::errors::BookingError;

/// Formulario de devolución tal como lo rellena el personal
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckinForm {
    pub mileage: f64,
    pub damage_present: bool,
    pub damage_notes: Option<String>,
    pub damage_cost: Option<f64>,
    /// Sin valor, el backend usa la hora actual
    pub return_time: Option<NaiveDateTime>,
}

/// Fila de la lista de devoluciones del día
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    pub booking: Booking,
    pub license_plate: String,
    pub phase: BookingPhase,
    pub minimum_mileage: Option<Decimal>,
    pub can_check_in: bool,
}

pub struct CheckinWorkflow {
    backend: Arc<dyn RentalBackend>,
}

impl CheckinWorkflow {
    pub fn new(backend: Arc<dyn RentalBackend>) -> Self {
        Self { backend }
    }

    pub async fn pending_returns(&self, date: NaiveDate) -> Result<Vec<ReturnItem>, BookingError> {
        let bookings = self.backend.returns_for(date).await?;
        let bookings = enrich_mileage(self.backend.as_ref(), bookings).await;

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let booking = booking.normalize();
                let phase = BookingPhase::of(&booking);
                ReturnItem {
                    license_plate: booking.vehicle.license_plate.normalized().to_string(),
                    minimum_mileage: booking.last_known_mileage(),
                    can_check_in: phase == BookingPhase::CheckedOut,
                    phase,
                    booking,
                }
            })
            .collect())
    }

    pub async fn check_in(&self, booking_id: i64, form: CheckinForm) -> Result<Booking, BookingError> {
        let mileage = positive_decimal("Return mileage", form.mileage)?;
        let damage_cost = match form.damage_cost {
            Some(cost) if !cost.is_finite() || cost < 0.0 => {
                return Err(BookingError::validation(
                    "Damage cost must be a non-negative number",
                ))
            }
            Some(cost) => Some(to_money("Damage cost", cost)?),
            None => None,
        };
        if form
            .damage_notes
            .as_deref()
            .is_some_and(|n| n.trim().chars().count() > MAX_NOTES_LENGTH)
        {
            return Err(BookingError::validation(format!(
                "Damage notes must not exceed {} characters",
                MAX_NOTES_LENGTH
            )));
        }

        let booking = self.backend.fetch_booking(booking_id).await?.normalize();
        booking_lifecycle::transition(BookingPhase::of(&booking), LifecycleEvent::CheckIn)?;

        let minimum = self.minimum_mileage(&booking).await?;
        if mileage < minimum {
            return Err(BookingError::mileage_below_minimum("Return mileage", minimum));
        }

        let request = CheckinRequest {
            mileage,
            damage_present: form.damage_present,
            damage_notes: form.damage_notes,
            damage_cost,
            actual_return_time: form.return_time,
        };

        let saved = self.backend.submit_checkin(booking_id, &request).await?;
        info!(
            "🏁 Devolución registrada para la reserva {} ({} km, cargos posteriores {})",
            saved.id,
            mileage.normalize(),
            saved.post_return_charges()
        );
        Ok(saved.normalize())
    }

    /// Kilometraje de salida, o el del vehículo si la reserva no lo trae.
    /// Sin ninguno de los dos no se envía nada.
    async fn minimum_mileage(&self, booking: &Booking) -> Result<Decimal, BookingError> {
        let mileage = match booking.last_known_mileage() {
            Some(mileage) => Some(mileage),
            None => match self.backend.fetch_vehicle(booking.vehicle_id).await {
                Ok(vehicle) => Some(vehicle.mileage),
                Err(BookingError::Transport(e)) if e.is_auth_failure() => {
                    return Err(BookingError::Transport(e));
                }
                Err(e) => {
                    warn!(
                        "⚠️ Sin kilometraje de referencia para la reserva {}: {}",
                        booking.id, e
                    );
                    None
                }
            },
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

/// Sin redondeo: el valor tecleado es el que se compara con el mínimo
fn positive_decimal(field: &str, value: f64) -> Result<Decimal, BookingError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(BookingError::validation(format!(
            "{} must be a number greater than 0",
            field
        )));
    }
    let mileage = Decimal::from_f64(value)
        .ok_or_else(|| BookingError::validation(format!("{} is out of range", field)))?;
    booking_lifecycle::validate_mileage(field, mileage)
}

fn to_money(field: &str, value: f64) -> Result<Decimal, BookingError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .ok_or_else(|| BookingError::validation(format!("{} is out of range", field)))
}
