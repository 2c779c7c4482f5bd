//! Rutas de Vehicles
//!
//! Los listados y el detalle son públicos; crear, actualizar, cambiar de
//! modo y borrar requieren usuario autenticado.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::vehicle_controller::VehicleController;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, SwitchModeRequest, UpdateVehicleRequest, VehicleFilters, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_vehicles).post(create_vehicle))
        .route(
            "/:id",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/:id/mode", put(switch_vehicle_mode))
        .route("/owner/:user_id", get(list_owner_vehicles))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Query(filters): Query<VehicleFilters>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let controller = VehicleController::new(&state);
    let vehicles = controller.list(filters).await?;
    Ok(Json(vehicles))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<VehicleResponse>> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.detail(id).await?;
    Ok(Json(vehicle))
}

async fn list_owner_vehicles(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<Vec<VehicleResponse>>> {
    let controller = VehicleController::new(&state);
    let vehicles = controller.list_by_owner(user_id).await?;
    Ok(Json(vehicles))
}

async fn create_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateVehicleRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<VehicleResponse>>)> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.create(user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            vehicle,
            "Vehicle added successfully".to_string(),
        )),
    ))
}

async fn update_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.update(user.user_id, id, request).await?;

    Ok(Json(ApiResponse::success_with_message(
        vehicle,
        "Vehicle updated successfully".to_string(),
    )))
}

async fn switch_vehicle_mode(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SwitchModeRequest>,
) -> AppResult<Json<ApiResponse<VehicleResponse>>> {
    let controller = VehicleController::new(&state);
    let vehicle = controller.switch_mode(user.user_id, id, request).await?;

    Ok(Json(ApiResponse::success_with_message(
        vehicle,
        "Rental mode updated successfully".to_string(),
    )))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let controller = VehicleController::new(&state);
    controller.delete(user.user_id, id).await?;

    Ok(Json(serde_json::json!({
        "message": "Vehicle deleted successfully"
    })))
}
