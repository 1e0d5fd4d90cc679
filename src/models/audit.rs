//! Registro de auditoría de acciones sobre reservas

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    BookingCreated,
    BookingConfirmed,
    BookingCancelled,
    Pickup,
    Return,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::BookingCreated => "BOOKING_CREATED",
            AuditAction::BookingConfirmed => "BOOKING_CONFIRMED",
            AuditAction::BookingCancelled => "BOOKING_CANCELLED",
            AuditAction::Pickup => "PICKUP",
            AuditAction::Return => "RETURN",
        }
    }
}

/// Una fila de auditoría; se escribe en la misma transacción que la reserva
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub booking_id: i64,
    pub actor: String,
    pub action: AuditAction,
    pub details: String,
    pub created_at: NaiveDateTime,
}

impl AuditEntry {
    pub fn new(
        actor: &str,
        action: AuditAction,
        booking_id: i64,
        details: String,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            actor: actor.to_string(),
            action,
            details,
            created_at,
        }
    }
}
