//! Servicios de negocio
//! 
//! Reglas del ciclo de vida de reservas (puras) y su orquestación.

pub mod booking_lifecycle;
pub mod booking_service;
pub mod cancellation_policy;
pub mod checkin_workflow;
pub mod checkout_workflow;
pub mod inventory_sync;
pub mod pricing_service;
pub mod rental_backend;

pub use booking_service::BookingService;
pub use checkin_workflow::{CheckinForm, CheckinWorkflow};
pub use checkout_workflow::CheckoutWorkflow;
pub use pricing_service::PricingEngine;
pub use rental_backend::{LocalBackend, RentalBackend};
