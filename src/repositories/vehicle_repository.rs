use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::models::vehicle::{PlateValue, Vehicle, VehicleStatus};
use crate::utils::errors::AppResult;

/// Lectura de vehículos (el inventario lo mantiene el backend)
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Vehicle>>;
}

// Fila de la tabla vehicles
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    id: i64,
    license_plate: String,
    brand: String,
    model: String,
    mileage: Decimal,
    daily_price: Decimal,
    location: String,
    status: VehicleStatus,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id,
            license_plate: PlateValue::Plain(row.license_plate),
            brand: row.brand,
            model: row.model,
            mileage: row.mileage,
            daily_price: row.daily_price,
            location: row.location,
            status: row.status,
        }
    }
}

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>(
            r#"
            SELECT id, license_plate, brand, model, mileage, daily_price, location, status
            FROM vehicles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Vehicle::from))
    }
}
