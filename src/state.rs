//! Shared application state
//! 
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::repositories::{InMemoryRepository, PgBookingRepository, PgVehicleRepository};
use crate::services::booking_service::BookingService;
use crate::services::pricing_service::PricingEngine;
use crate::utils::jwt::JwtConfig;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<EnvironmentConfig>,
    pub bookings: Arc<BookingService>,
}

impl AppState {
    pub fn new(config: EnvironmentConfig, bookings: Arc<BookingService>) -> Self {
        Self {
            config: Arc::new(config),
            bookings,
        }
    }

    /// Estado respaldado por PostgreSQL
    pub fn with_postgres(config: EnvironmentConfig, pool: PgPool) -> Self {
        let service = BookingService::new(
            Arc::new(PgBookingRepository::new(pool.clone())),
            Arc::new(PgVehicleRepository::new(pool)),
            PricingEngine::new(config.tax_rate),
        );
        Self::new(config, Arc::new(service))
    }

    /// Estado en memoria (desarrollo y tests)
    pub fn in_memory(config: EnvironmentConfig, repository: InMemoryRepository) -> Self {
        let repository = Arc::new(repository);
        let service = BookingService::new(
            repository.clone(),
            repository,
            PricingEngine::new(config.tax_rate),
        );
        Self::new(config, Arc::new(service))
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::from(self.config.as_ref())
    }
}
