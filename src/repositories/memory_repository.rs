//! Repositorio en memoria
//!
//! Implementa `BookingRepository` y `VehicleRepository` sobre un estado
//! compartido protegido por un `RwLock` de tokio. Mantiene las mismas
//! garantías que la versión PostgreSQL: prevención de solapes, control de
//! versión optimista y escritura atómica de reserva + vehículo + auditoría.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::audit::AuditEntry;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::vehicle::{PlateValue, Vehicle, VehicleStatus};
use crate::repositories::booking_repository::{
    BookingRepository, CONCURRENT_MODIFICATION, VEHICLE_ALREADY_BOOKED, VEHICLE_NOT_AVAILABLE,
};
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::inventory_sync::VehicleUpdate;
use crate::utils::errors::{AppResult, BookingError};

#[derive(Debug, Default)]
struct MemoryState {
    bookings: BTreeMap<i64, Booking>,
    vehicles: HashMap<i64, Vehicle>,
    audit: Vec<AuditEntry>,
    next_id: i64,
}

impl MemoryState {
    /// Equivalente al JOIN con vehicles: el snapshot refleja el vehículo actual
    fn hydrate(&self, booking: &Booking) -> Booking {
        let mut booking = booking.clone();
        if let Some(vehicle) = self.vehicles.get(&booking.vehicle_id) {
            booking.vehicle = vehicle.snapshot();
        }
        booking
    }

    fn select<F>(&self, filter: F) -> Vec<Booking>
    where
        F: Fn(&Booking) -> bool,
    {
        self.bookings
            .values()
            .filter(|b| filter(b))
            .map(|b| self.hydrate(b))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flota de ejemplo para ejecuciones locales sin base de datos
    pub fn with_demo_fleet() -> Self {
        let fleet = [
            (1, "B-RC-1001", "VW", "Golf", 45, 32150, "Berlin"),
            (2, "M-RC-2002", "BMW", "320d", 60, 50000, "München"),
            (3, "HH-RC-3003", "Opel", "Corsa", 35, 18420, "Hamburg"),
            (4, "K-RC-4004", "Mercedes", "V-Klasse", 70, 88900, "Köln"),
        ];

        let mut state = MemoryState::default();
        for (id, plate, brand, model, price, mileage, location) in fleet {
            state.vehicles.insert(
                id,
                Vehicle {
                    id,
                    license_plate: PlateValue::from(plate),
                    brand: brand.to_string(),
                    model: model.to_string(),
                    mileage: Decimal::from(mileage),
                    daily_price: Decimal::from(price),
                    location: location.to_string(),
                    status: VehicleStatus::Available,
                },
            );
        }

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn seed_vehicle(&self, vehicle: Vehicle) {
        let mut state = self.state.write().await;
        state.vehicles.insert(vehicle.id, vehicle);
    }

    /// Filas de auditoría en orden de escritura
    pub async fn audit_log(&self) -> Vec<AuditEntry> {
        self.state.read().await.audit.clone()
    }
}

#[async_trait]
impl VehicleRepository for InMemoryRepository {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<Vehicle>> {
        Ok(self.state.read().await.vehicles.get(&id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryRepository {
    async fn insert(&self, booking: &Booking, audit: &AuditEntry) -> AppResult<Booking> {
        let mut state = self.state.write().await;

        if !state.vehicles.contains_key(&booking.vehicle_id) {
            return Err(BookingError::vehicle_not_found(booking.vehicle_id).into());
        }

        let overlapping = state.bookings.values().any(|existing| {
            existing.vehicle_id == booking.vehicle_id
                && existing.status.is_active()
                && existing.overlaps(booking.pickup_date, booking.return_date)
        });
        if overlapping {
            warn!(
                "⚠️ Reserva solapada rechazada para el vehículo {} ({} - {})",
                booking.vehicle_id, booking.pickup_date, booking.return_date
            );
            return Err(BookingError::conflict(VEHICLE_ALREADY_BOOKED).into());
        }

        state.next_id += 1;
        let id = state.next_id;

        let mut stored = booking.clone();
        stored.id = id;
        stored.version = 1;
        stored.created_at = Some(audit.created_at);
        stored.updated_at = Some(audit.created_at);

        let mut entry = audit.clone();
        entry.booking_id = id;

        state.bookings.insert(id, stored);
        state.audit.push(entry);

        debug!("💾 Reserva {} insertada (memoria)", id);
        Ok(state.hydrate(&state.bookings[&id]))
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<Booking>> {
        let state = self.state.read().await;
        Ok(state.bookings.get(&id).map(|b| state.hydrate(b)))
    }

    async fn commit_transition(
        &self,
        expected_version: i32,
        booking: &Booking,
        vehicle_update: Option<&VehicleUpdate>,
        audit: &AuditEntry,
    ) -> AppResult<Booking> {
        let mut state = self.state.write().await;

        let current_version = state
            .bookings
            .get(&booking.id)
            .map(|stored| stored.version)
            .ok_or_else(|| BookingError::booking_not_found(booking.id))?;

        if current_version != expected_version {
            warn!(
                "⚠️ Versión {} de la reserva {} ya no es la actual ({})",
                expected_version, booking.id, current_version
            );
            return Err(BookingError::conflict(CONCURRENT_MODIFICATION).into());
        }

        if let Some(update) = vehicle_update {
            let vehicle = state
                .vehicles
                .get_mut(&update.vehicle_id)
                .ok_or_else(|| BookingError::vehicle_not_found(update.vehicle_id))?;
            if update.is_handover() && !vehicle.is_available() {
                warn!(
                    "⚠️ Vehículo {} no disponible al confirmar la entrega de la reserva {}",
                    update.vehicle_id, booking.id
                );
                return Err(BookingError::conflict(VEHICLE_NOT_AVAILABLE).into());
            }
            update.apply(vehicle);
        }

        let mut stored = booking.clone();
        stored.version = expected_version + 1;
        stored.updated_at = Some(audit.created_at);

        let mut entry = audit.clone();
        entry.booking_id = booking.id;

        state.bookings.insert(booking.id, stored);
        state.audit.push(entry);

        Ok(state.hydrate(&state.bookings[&booking.id]))
    }

    async fn find_by_pickup_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state.select(|b| b.pickup_date == date && b.status == status))
    }

    async fn find_by_return_date(
        &self,
        date: NaiveDate,
        status: BookingStatus,
    ) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        Ok(state.select(|b| b.return_date == date && b.status == status))
    }

    async fn find_by_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings = state.select(|b| b.customer_id == customer_id);
        bookings.sort_by(|a, b| b.pickup_date.cmp(&a.pickup_date).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }
}
