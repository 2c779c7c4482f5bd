//! Rutas de autenticación

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};

use crate::controllers::auth_controller::AuthController;
use crate::dto::auth_dto::{
    LoginRequest, LoginResponse, RegisterRequest, UpdateProfileRequest, UserResponse,
    VerifyEmailRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify_email))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<UserResponse>>)> {
    let controller = AuthController::new(&state);
    let user = controller.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            user,
            "Registration successful! Please check your email.".to_string(),
        )),
    ))
}

async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let controller = AuthController::new(&state);
    let user = controller.verify_email(request).await?;

    Ok(Json(ApiResponse::success_with_message(
        user,
        "Email verified successfully!".to_string(),
    )))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let controller = AuthController::new(&state);
    let response = controller.login(request).await?;
    Ok(Json(response))
}

async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<Json<UserResponse>> {
    let controller = AuthController::new(&state);
    let profile = controller.me(user.user_id).await?;
    Ok(Json(profile))
}

async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<UserResponse>>> {
    let controller = AuthController::new(&state);
    let profile = controller.update_profile(user.user_id, request).await?;

    Ok(Json(ApiResponse::success_with_message(
        profile,
        "Profile updated".to_string(),
    )))
}
