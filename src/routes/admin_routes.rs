//! Rutas de administración

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::admin_controller::{AdminController, AdminDataResponse};
use crate::dto::auth_dto::UserResponse;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/data", get(admin_data))
        .route("/users/:id/clear-debt", put(clear_debt))
        .route("/users/:id/approve", put(approve_account))
}

async fn admin_data(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<Json<AdminDataResponse>> {
    let controller = AdminController::new(&state);
    let data = controller.data().await?;
    Ok(Json(data))
}

async fn clear_debt(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let controller = AdminController::new(&state);
    let user = controller.clear_debt(id).await?;

    Ok(Json(ApiResponse::success_with_message(
        user,
        "Debt cleared".to_string(),
    )))
}

async fn approve_account(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let controller = AdminController::new(&state);
    let user = controller.approve(id).await?;

    Ok(Json(ApiResponse::success_with_message(
        user,
        "Account approved".to_string(),
    )))
}
