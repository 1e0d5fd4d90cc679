//! Modelo de Booking
//!
//! Una reserva de un vehículo para un rango de fechas por un cliente.
//! Nunca se borra físicamente: los estados terminales son CANCELLED y COMPLETED.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Type;

use super::vehicle::VehicleSnapshot;

/// Estado persistido de la reserva - mapea al ENUM booking_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[serde(alias = "ANFRAGE")]
    Requested,
    #[serde(alias = "BESTÄTIGT", alias = "BESTAETIGT")]
    Confirmed,
    #[serde(alias = "STORNIERT")]
    Cancelled,
    #[serde(alias = "ABGESCHLOSSEN")]
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Requested => "REQUESTED",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    /// Reservas que bloquean el vehículo para el rango de fechas
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Requested | BookingStatus::Confirmed)
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extras opcionales, facturados por día de alquiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extras {
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub additional_driver: bool,
    #[serde(default)]
    pub child_seat: bool,
}

impl Extras {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Reserva - entidad central
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub customer_id: i64,
    #[serde(default)]
    pub vehicle_id: i64,
    #[serde(default)]
    pub vehicle: VehicleSnapshot,

    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    pub pickup_location: String,
    pub return_location: String,

    #[serde(flatten)]
    pub extras: Extras,
    #[serde(default)]
    pub extras_cost: Decimal,
    /// Fijado al crear la reserva; nunca se recalcula
    pub total_price: Decimal,

    pub status: BookingStatus,
    #[serde(default)]
    pub cancellation_date: Option<NaiveDateTime>,

    // Entrega (check-out)
    #[serde(default)]
    pub checkout_time: Option<NaiveDateTime>,
    #[serde(default)]
    pub checkout_mileage: Option<Decimal>,
    #[serde(default)]
    pub checkout_notes: Option<String>,

    // Devolución (check-in)
    #[serde(default, alias = "checkinTime")]
    pub return_time: Option<NaiveDateTime>,
    #[serde(default, alias = "checkinMileage")]
    pub return_mileage: Option<Decimal>,
    #[serde(default)]
    pub damage_present: bool,
    #[serde(default)]
    pub damage_notes: Option<String>,
    #[serde(default)]
    pub damage_cost: Option<Decimal>,
    #[serde(default)]
    pub extra_mileage_cost: Option<Decimal>,
    #[serde(default)]
    pub late_fee: Option<Decimal>,

    /// Versión para control de concurrencia optimista
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

impl Booking {
    /// Normaliza los campos que el backend puede omitir.
    /// Se llama una vez en la frontera de transporte.
    pub fn normalize(mut self) -> Self {
        if self.vehicle_id == 0 {
            self.vehicle_id = self.vehicle.id;
        }
        if self.vehicle.id == 0 {
            self.vehicle.id = self.vehicle_id;
        }
        self
    }

    pub fn is_checked_out(&self) -> bool {
        self.checkout_time.is_some()
    }

    pub fn is_returned(&self) -> bool {
        self.return_time.is_some()
    }

    /// Último kilometraje conocido: el de la entrega, o el del vehículo
    pub fn last_known_mileage(&self) -> Option<Decimal> {
        self.checkout_mileage.or(self.vehicle.mileage)
    }

    /// Intervalo cerrado [pickup, return] se solapa con otro
    pub fn overlaps(&self, pickup_date: NaiveDate, return_date: NaiveDate) -> bool {
        self.pickup_date <= return_date && pickup_date <= self.return_date
    }

    /// Cargos posteriores a la devolución (no alteran total_price)
    pub fn post_return_charges(&self) -> Decimal {
        self.damage_cost.unwrap_or_default()
            + self.extra_mileage_cost.unwrap_or_default()
            + self.late_fee.unwrap_or_default()
    }
}
