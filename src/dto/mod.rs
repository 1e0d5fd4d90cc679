//! DTOs (Data Transfer Objects)
//! 
//! Cuerpos de request/response de la API REST de reservas.

pub mod booking_dto;

pub use booking_dto::*;
