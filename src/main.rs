use anyhow::{anyhow, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use rental_booking::config::{DatabaseConfig, EnvironmentConfig, StorageBackend};
use rental_booking::database::DatabaseConnection;
use rental_booking::repositories::InMemoryRepository;
use rental_booking::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging (RUST_LOG o DEBUG por defecto)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    info!("🚗 Rental Booking API");
    info!("================================================");

    let config = EnvironmentConfig::from_env()?;

    let state = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
            let db_config =
                DatabaseConfig::new(url).with_max_connections(config.database_max_connections);
            let db_connection = match DatabaseConnection::new(&db_config).await {
                Ok(conn) => conn,
                Err(e) => {
                    error!("❌ Error conectando a la base de datos: {}", e);
                    return Err(anyhow!("Error de base de datos: {}", e));
                }
            };
            let pool = db_connection.pool().clone();
            AppState::with_postgres(config, pool)
        }
        StorageBackend::Memory => {
            warn!("🧪 STORAGE=memory: reservas en memoria con flota de ejemplo");
            AppState::in_memory(config, InMemoryRepository::with_demo_fleet())
        }
    };

    if state.config.is_production() && state.config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: se aceptan todos los orígenes");
    }

    let addr: SocketAddr = state.config.server_url().parse()?;
    let app = create_router(state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("📅 Reservas:");
    info!("   POST /api/bookings - Solicitar reserva");
    info!("   GET  /api/bookings/quote - Presupuesto");
    info!("   GET  /api/bookings/:id - Obtener reserva");
    info!("   GET  /api/bookings/customer/:id - Historial del cliente");
    info!("   PUT  /api/bookings/:id/cancel - Cancelar");
    info!("🔑 Personal:");
    info!("   PUT  /api/bookings/:id/confirm - Confirmar");
    info!("   PUT  /api/bookings/:id/checkout - Entrega");
    info!("   PUT  /api/bookings/:id/checkin - Devolución");
    info!("   GET  /api/bookings/pickups?date= - Entregas del día");
    info!("   GET  /api/bookings/requests?date= - Solicitudes del día");
    info!("   GET  /api/bookings/returns?date= - Devoluciones del día");
    info!("🚙 Vehículos:");
    info!("   GET  /api/vehicles/:id - Obtener vehículo");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo escuchar Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el manejador de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
