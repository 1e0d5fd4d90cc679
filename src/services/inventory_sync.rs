//! Sincronización de inventario
//!
//! El backend es la fuente de verdad del estado de cada vehículo. Aquí solo
//! se describen los efectos que una entrega o devolución tiene sobre el
//! vehículo, y el enriquecimiento de las instantáneas de kilometraje.

use futures::future::join_all;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::booking::Booking;
use crate::models::vehicle::{Vehicle, VehicleStatus};
use crate::services::rental_backend::RentalBackend;

/// Efecto de una transición sobre el vehículo; se persiste junto a la reserva
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub vehicle_id: i64,
    pub mileage: Decimal,
    pub status: VehicleStatus,
}

impl VehicleUpdate {
    /// Entrega: el vehículo pasa a RENTED con el kilometraje de salida
    pub fn handover(vehicle_id: i64, mileage: Decimal) -> Self {
        Self {
            vehicle_id,
            mileage,
            status: VehicleStatus::Rented,
        }
    }

    /// Devolución: el vehículo vuelve a AVAILABLE con el kilometraje de llegada
    pub fn release(vehicle_id: i64, mileage: Decimal) -> Self {
        Self {
            vehicle_id,
            mileage,
            status: VehicleStatus::Available,
        }
    }

    /// Una entrega solo puede aplicarse sobre un vehículo AVAILABLE
    pub fn is_handover(&self) -> bool {
        self.status == VehicleStatus::Rented
    }

    /// Aplica el efecto; el kilometraje de registro nunca decrece
    pub fn apply(&self, vehicle: &mut Vehicle) {
        vehicle.mileage = vehicle.mileage.max(self.mileage);
        vehicle.status = self.status;
    }
}

/// Completa el kilometraje de las reservas cuyo snapshot no lo trae.
///
/// Es una lectura auxiliar: si falla, la reserva se queda sin kilometraje
/// y la vista sigue adelante.
pub async fn enrich_mileage<B>(backend: &B, bookings: Vec<Booking>) -> Vec<Booking>
where
    B: RentalBackend + ?Sized,
{
    let lookups = bookings.into_iter().map(|mut booking| async move {
        if booking.vehicle.mileage.is_some() || booking.vehicle_id == 0 {
            return booking;
        }
        match backend.fetch_vehicle(booking.vehicle_id).await {
            Ok(vehicle) => {
                debug!(
                    "🚗 Kilometraje de {} completado: {}",
                    vehicle.label(),
                    vehicle.mileage
                );
                booking.vehicle.mileage = Some(vehicle.mileage);
                if booking.vehicle.location.is_none() {
                    booking.vehicle.location = Some(vehicle.location);
                }
            }
            Err(e) => {
                warn!(
                    "⚠️ No se pudo leer el vehículo {} para la reserva {}: {}",
                    booking.vehicle_id, booking.id, e
                );
            }
        }
        booking
    });

    join_all(lookups).await
}
