//! Reservas de alquiler de vehículos
//! 
//! Núcleo de reglas del ciclo de vida (precio, cancelación, entrega y
//! devolución), la API axum que lo expone y el cliente REST que la consume.

pub mod client;
pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

pub use routes::create_router;
pub use state::AppState;
