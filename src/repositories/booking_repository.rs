use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, warn};

use crate::models::audit::AuditEntry;
use crate::models::booking::{Booking, BookingStatus, Extras};
use crate::models::vehicle::{PlateValue, VehicleSnapshot};
use crate::services::inventory_sync::VehicleUpdate;
use crate::utils::errors::{AppResult, BookingError};

pub const CONCURRENT_MODIFICATION: &str =
    "Booking was modified concurrently; refresh and try again";
pub const VEHICLE_ALREADY_BOOKED: &str = "Vehicle is not available for the requested period";
pub const VEHICLE_NOT_AVAILABLE: &str = "Vehicle is no longer available for handover";

/// Persistencia de reservas.
///
/// Cada escritura es atómica: la reserva, el efecto sobre el vehículo y la
/// fila de auditoría se guardan juntos o no se guardan.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserta una reserva nueva. Falla con Conflict si el vehículo ya tiene
    /// una reserva activa que se solapa con el rango.
    async fn insert(&self, booking: &Booking, audit: &AuditEntry) -> AppResult<Booking>;

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Booking>>;

    /// Guarda una transición solo si la versión almacenada sigue siendo
    /// `expected_version`; en otro caso Conflict.
    async fn commit_transition(
        &self,
        expected_version: i32,
        booking: &Booking,
        vehicle_update: Option<&VehicleUpdate>,
        audit: &AuditEntry,
    ) -> AppResult<Booking>;

    async fn find_by_pickup_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>>;

    async fn find_by_return_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>>;

    async fn find_by_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>>;
}

const BOOKING_SELECT: &str = r#"
    SELECT b.id, b.customer_id, b.vehicle_id, b.pickup_date, b.return_date,
           b.pickup_location, b.return_location,
           b.insurance, b.additional_driver, b.child_seat, b.extras_cost, b.total_price,
           b.status, b.cancellation_date,
           b.checkout_time, b.checkout_mileage, b.checkout_notes,
           b.return_time, b.return_mileage, b.damage_present, b.damage_notes, b.damage_cost,
           b.extra_mileage_cost, b.late_fee, b.version, b.created_at, b.updated_at,
           v.brand AS vehicle_brand, v.model AS vehicle_model,
           v.license_plate AS vehicle_license_plate, v.daily_price AS vehicle_daily_price,
           v.mileage AS vehicle_mileage, v.location AS vehicle_location
    FROM bookings b
    JOIN vehicles v ON v.id = b.vehicle_id
"#;

// Fila de bookings con los datos del vehículo (JOIN)
#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: i64,
    customer_id: i64,
    vehicle_id: i64,
    pickup_date: NaiveDate,
    return_date: NaiveDate,
    pickup_location: String,
    return_location: String,
    insurance: bool,
    additional_driver: bool,
    child_seat: bool,
    extras_cost: Decimal,
    total_price: Decimal,
    status: BookingStatus,
    cancellation_date: Option<NaiveDateTime>,
    checkout_time: Option<NaiveDateTime>,
    checkout_mileage: Option<Decimal>,
    checkout_notes: Option<String>,
    return_time: Option<NaiveDateTime>,
    return_mileage: Option<Decimal>,
    damage_present: bool,
    damage_notes: Option<String>,
    damage_cost: Option<Decimal>,
    extra_mileage_cost: Option<Decimal>,
    late_fee: Option<Decimal>,
    version: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    vehicle_brand: String,
    vehicle_model: String,
    vehicle_license_plate: String,
    vehicle_daily_price: Decimal,
    vehicle_mileage: Decimal,
    vehicle_location: String,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Booking {
            id: row.id,
            customer_id: row.customer_id,
            vehicle_id: row.vehicle_id,
            vehicle: VehicleSnapshot {
                id: row.vehicle_id,
                brand: row.vehicle_brand,
                model: row.vehicle_model,
                license_plate: PlateValue::Plain(row.vehicle_license_plate),
                daily_price: row.vehicle_daily_price,
                mileage: Some(row.vehicle_mileage),
                location: Some(row.vehicle_location),
            },
            pickup_date: row.pickup_date,
            return_date: row.return_date,
            pickup_location: row.pickup_location,
            return_location: row.return_location,
            extras: Extras {
                insurance: row.insurance,
                additional_driver: row.additional_driver,
                child_seat: row.child_seat,
            },
            extras_cost: row.extras_cost,
            total_price: row.total_price,
            status: row.status,
            cancellation_date: row.cancellation_date,
            checkout_time: row.checkout_time,
            checkout_mileage: row.checkout_mileage,
            checkout_notes: row.checkout_notes,
            return_time: row.return_time,
            return_mileage: row.return_mileage,
            damage_present: row.damage_present,
            damage_notes: row.damage_notes,
            damage_cost: row.damage_cost,
            extra_mileage_cost: row.extra_mileage_cost,
            late_fee: row.late_fee,
            version: row.version,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_by_id(&self, id: i64) -> AppResult<Booking> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(id).into())
    }

    async fn fetch_where(&self, condition: &str, date: NaiveDate, status: BookingStatus) -> AppResult<Vec<Booking>> {
        let sql = format!("{} WHERE {} ORDER BY b.pickup_date, b.id", BOOKING_SELECT, condition);
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(date)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}

async fn insert_audit(
    tx: &mut Transaction<'_, Postgres>,
    audit: &AuditEntry,
    booking_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO booking_audit (id, booking_id, actor, action, details, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(audit.id)
    .bind(booking_id)
    .bind(&audit.actor)
    .bind(audit.action.as_str())
    .bind(&audit.details)
    .bind(audit.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn insert(&self, booking: &Booking, audit: &AuditEntry) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        // Serializa las reservas concurrentes del mismo vehículo
        let locked: Option<(i64,)> = sqlx::query_as("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
            .bind(booking.vehicle_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(BookingError::vehicle_not_found(booking.vehicle_id).into());
        }

        let (overlapping,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM bookings
                WHERE vehicle_id = $1
                  AND status IN ('REQUESTED', 'CONFIRMED')
                  AND pickup_date <= $3
                  AND $2 <= return_date
            )
            "#,
        )
        .bind(booking.vehicle_id)
        .bind(booking.pickup_date)
        .bind(booking.return_date)
        .fetch_one(&mut *tx)
        .await?;

        if overlapping {
            warn!(
                "⚠️ Reserva solapada rechazada para el vehículo {} ({} - {})",
                booking.vehicle_id, booking.pickup_date, booking.return_date
            );
            return Err(BookingError::conflict(VEHICLE_ALREADY_BOOKED).into());
        }

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO bookings (
                customer_id, vehicle_id, pickup_date, return_date, pickup_location, return_location,
                insurance, additional_driver, child_seat, extras_cost, total_price, status,
                version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, 1, $13, $13)
            RETURNING id
            "#,
        )
        .bind(booking.customer_id)
        .bind(booking.vehicle_id)
        .bind(booking.pickup_date)
        .bind(booking.return_date)
        .bind(&booking.pickup_location)
        .bind(&booking.return_location)
        .bind(booking.extras.insurance)
        .bind(booking.extras.additional_driver)
        .bind(booking.extras.child_seat)
        .bind(booking.extras_cost)
        .bind(booking.total_price)
        .bind(booking.status)
        .bind(audit.created_at)
        .fetch_one(&mut *tx)
        .await?;

        insert_audit(&mut tx, audit, id).await?;
        tx.commit().await?;

        debug!("💾 Reserva {} insertada", id);
        self.fetch_by_id(id).await
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
        let sql = format!("{} WHERE b.id = $1", BOOKING_SELECT);
        let row = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Booking::from))
    }

    async fn commit_transition(
        &self,
        expected_version: i32,
        booking: &Booking,
        vehicle_update: Option<&VehicleUpdate>,
        audit: &AuditEntry,
    ) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE bookings SET
                status = $3,
                cancellation_date = $4,
                checkout_time = $5,
                checkout_mileage = $6,
                checkout_notes = $7,
                return_time = $8,
                return_mileage = $9,
                damage_present = $10,
                damage_notes = $11,
                damage_cost = $12,
                extra_mileage_cost = $13,
                late_fee = $14,
                updated_at = $15,
                version = version + 1
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(booking.id)
        .bind(expected_version)
        .bind(booking.status)
        .bind(booking.cancellation_date)
        .bind(booking.checkout_time)
        .bind(booking.checkout_mileage)
        .bind(&booking.checkout_notes)
        .bind(booking.return_time)
        .bind(booking.return_mileage)
        .bind(booking.damage_present)
        .bind(&booking.damage_notes)
        .bind(booking.damage_cost)
        .bind(booking.extra_mileage_cost)
        .bind(booking.late_fee)
        .bind(audit.created_at)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            warn!(
                "⚠️ Versión {} de la reserva {} ya no es la actual",
                expected_version, booking.id
            );
            return Err(BookingError::conflict(CONCURRENT_MODIFICATION).into());
        }

        if let Some(update) = vehicle_update {
            // La entrega exige AVAILABLE en la misma sentencia que la marca RENTED
            let vehicle = sqlx::query(
                r#"
                UPDATE vehicles
                SET mileage = GREATEST(mileage, $2), status = $3
                WHERE id = $1 AND ($4 = FALSE OR status = 'AVAILABLE')
                "#,
            )
            .bind(update.vehicle_id)
            .bind(update.mileage)
            .bind(update.status)
            .bind(update.is_handover())
            .execute(&mut *tx)
            .await?;

            if vehicle.rows_affected() == 0 {
                warn!(
                    "⚠️ Vehículo {} no disponible al confirmar la entrega de la reserva {}",
                    update.vehicle_id, booking.id
                );
                return Err(BookingError::conflict(VEHICLE_NOT_AVAILABLE).into());
            }
        }

        insert_audit(&mut tx, audit, booking.id).await?;
        tx.commit().await?;

        self.fetch_by_id(booking.id).await
    }

    async fn find_by_pickup_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        self.fetch_where("b.pickup_date = $1 AND b.status = $2", date, status)
            .await
    }

    async fn find_by_return_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        self.fetch_where("b.return_date = $1 AND b.status = $2", date, status)
            .await
    }

    async fn find_by_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>> {
        let sql = format!(
            "{} WHERE b.customer_id = $1 ORDER BY b.pickup_date DESC, b.id DESC",
            BOOKING_SELECT
        );
        let rows = sqlx::query_as::<_, BookingRow>(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Booking::from).collect())
    }
}
