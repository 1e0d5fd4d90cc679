//! Controladores
//! 
//! Capa entre las rutas HTTP y el `BookingService`: fija la hora de la
//! operación y deja traza de cada llamada.

pub mod booking_controller;
pub mod vehicle_controller;

pub use booking_controller::BookingController;
pub use vehicle_controller::VehicleController;
