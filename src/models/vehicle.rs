//! Modelo de Vehicle
//!
//! Este módulo contiene el struct Vehicle, su estado de inventario y la
//! instantánea denormalizada que viaja dentro de cada reserva.
//! Mapea exactamente al schema PostgreSQL con primary key 'id'.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;

/// Estado del vehículo - mapea al ENUM vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "vehicle_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    #[serde(alias = "VERFÜGBAR", alias = "VERFUEGBAR")]
    Available,
    #[serde(alias = "VERMIETET")]
    Rented,
    #[serde(alias = "WARTUNG")]
    Maintenance,
    #[serde(alias = "AUSSER_BETRIEB")]
    OutOfService,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "AVAILABLE",
            VehicleStatus::Rented => "RENTED",
            VehicleStatus::Maintenance => "MAINTENANCE",
            VehicleStatus::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matrícula tal como llega del backend.
///
/// El backend puede enviar un string plano, un objeto `{ "value": ... }`
/// o un marcador cifrado. La normalización ocurre una única vez al
/// deserializar; el resto del código solo ve esta variante.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PlateValue {
    Plain(String),
    #[default]
    Redacted,
}

impl PlateValue {
    /// Matrícula como string plano (vacío si el backend la ocultó)
    pub fn normalized(&self) -> &str {
        match self {
            PlateValue::Plain(value) => value,
            PlateValue::Redacted => "",
        }
    }

    pub fn is_redacted(&self) -> bool {
        matches!(self, PlateValue::Redacted)
    }
}

impl From<String> for PlateValue {
    fn from(value: String) -> Self {
        PlateValue::Plain(value)
    }
}

impl From<&str> for PlateValue {
    fn from(value: &str) -> Self {
        PlateValue::Plain(value.to_string())
    }
}

impl std::fmt::Display for PlateValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.normalized())
    }
}

/// Formas de matrícula aceptadas en el cable
#[derive(Deserialize)]
#[serde(untagged)]
enum WirePlate {
    Text(String),
    Wrapped { value: String },
    Other(serde_json::Value),
}

impl<'de> Deserialize<'de> for PlateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WirePlate::deserialize(deserializer)? {
            WirePlate::Text(value) | WirePlate::Wrapped { value } => PlateValue::Plain(value),
            WirePlate::Other(_) => PlateValue::Redacted,
        })
    }
}

impl Serialize for PlateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PlateValue::Plain(value) => serializer.serialize_str(value),
            PlateValue::Redacted => serializer.serialize_none(),
        }
    }
}

/// Vehicle principal - mapea a la tabla vehicles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub license_plate: PlateValue,
    pub brand: String,
    pub model: String,
    /// Odómetro de registro; nunca decrece
    pub mileage: Decimal,
    pub daily_price: Decimal,
    pub location: String,
    pub status: VehicleStatus,
}

impl Vehicle {
    /// Instantánea denormalizada que se guarda junto a la reserva
    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id,
            brand: self.brand.clone(),
            model: self.model.clone(),
            license_plate: self.license_plate.clone(),
            daily_price: self.daily_price,
            mileage: Some(self.mileage),
            location: Some(self.location.clone()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    /// Etiqueta corta para logs: "VW Golf (B-RC-1001)"
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.license_plate)
    }
}

/// Instantánea del vehículo dentro de una reserva (para mostrar y para
/// el cálculo de check-out/check-in)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSnapshot {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub license_plate: PlateValue,
    #[serde(default, alias = "dailyRate")]
    pub daily_price: Decimal,
    #[serde(default)]
    pub mileage: Option<Decimal>,
    #[serde(default)]
    pub location: Option<String>,
}
