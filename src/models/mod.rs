//! Modelos del sistema
//! 
//! Este módulo contiene los modelos de datos que mapean al schema PostgreSQL
//! y al formato JSON del backend de reservas.

pub mod audit;
pub mod auth;
pub mod booking;
pub mod vehicle;

pub use audit::{AuditAction, AuditEntry};
pub use auth::{AuthenticatedUser, UserRole};
pub use booking::{Booking, BookingStatus, Extras};
pub use vehicle::{PlateValue, Vehicle, VehicleSnapshot, VehicleStatus};
