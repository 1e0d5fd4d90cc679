use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::booking::Extras;
use crate::services::pricing_service::PriceBreakdown;
use crate::utils::validation::{validate_not_blank, validate_notes};

// Request para solicitar una reserva
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Obligatorio para el personal; un cliente reserva siempre para sí mismo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<i64>,
    #[validate(range(min = 1))]
    pub vehicle_id: i64,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub pickup_location: String,
    #[validate(length(max = 255), custom = "validate_not_blank")]
    pub return_location: String,
    #[serde(flatten)]
    pub extras: Extras,
}

// Request de entrega; sin kilometraje se usa el del vehículo
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<Decimal>,
    #[serde(default)]
    #[validate(custom = "validate_notes")]
    pub notes: Option<String>,
}

// Request de devolución
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckinRequest {
    pub mileage: Decimal,
    #[serde(default)]
    pub damage_present: bool,
    #[serde(default)]
    #[validate(custom = "validate_notes")]
    pub damage_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_return_time: Option<NaiveDateTime>,
}

// Query ?date= de las listas diarias (por defecto, hoy)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DateQuery {
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

// Query del presupuesto
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteQuery {
    pub vehicle_id: i64,
    pub pickup_date: NaiveDate,
    pub return_date: NaiveDate,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub additional_driver: bool,
    #[serde(default)]
    pub child_seat: bool,
}

impl QuoteQuery {
    pub fn extras(&self) -> Extras {
        Extras {
            insurance: self.insurance,
            additional_driver: self.additional_driver,
            child_seat: self.child_seat,
        }
    }
}

// Response del presupuesto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub vehicle_id: i64,
    pub daily_price: Decimal,
    #[serde(flatten)]
    pub price: PriceBreakdown,
}
