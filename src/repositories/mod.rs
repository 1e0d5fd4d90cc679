//! Repositorios
//! 
//! Acceso a datos de reservas y vehículos: traits con una implementación
//! PostgreSQL (sqlx) y otra en memoria.

pub mod booking_repository;
pub mod memory_repository;
pub mod vehicle_repository;

pub use booking_repository::{BookingRepository, PgBookingRepository};
pub use memory_repository::InMemoryRepository;
pub use vehicle_repository::{PgVehicleRepository, VehicleRepository};
