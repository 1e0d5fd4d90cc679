use std::sync::Arc;

use crate::models::vehicle::Vehicle;
use crate::services::booking_service::BookingService;
use crate::utils::errors::AppResult;

pub struct VehicleController {
    service: Arc<BookingService>,
}

impl VehicleController {
    pub fn new(service: Arc<BookingService>) -> Self {
        Self { service }
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Vehicle> {
        self.service.vehicle(id).await
    }
}
