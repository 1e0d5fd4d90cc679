use axum::{
    extract::{Path, State},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};

use crate::controllers::vehicle_controller::VehicleController;
use crate::middleware::auth::auth_middleware;
use crate::models::vehicle::Vehicle;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/:id", get(get_vehicle))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vehicle>, AppError> {
    let controller = VehicleController::new(state.bookings.clone());
    Ok(Json(controller.get_by_id(id).await?))
}
