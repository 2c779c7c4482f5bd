//! Rutas de Bookings

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    routing::post,
    Json, Router,
};
use uuid::Uuid;

use crate::controllers::booking_controller::BookingController;
use crate::dto::booking_dto::{
    BookingListQuery, BookingResponse, CreateBookingRequest, UpdateBookingRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::utils::errors::AppResult;

pub fn create_booking_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_booking).get(list_bookings))
        .route(
            "/:id",
            get(get_booking).put(update_booking).delete(cancel_booking),
        )
}

async fn create_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBookingRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BookingResponse>>)> {
    let controller = BookingController::new(&state);
    let booking = controller.create(user.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_message(
            booking,
            "Booking created successfully".to_string(),
        )),
    ))
}

async fn list_bookings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<BookingListQuery>,
) -> AppResult<Json<Vec<BookingResponse>>> {
    let controller = BookingController::new(&state);
    let bookings = controller.list(user.user_id, query).await?;
    Ok(Json(bookings))
}

async fn get_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookingResponse>> {
    let controller = BookingController::new(&state);
    let booking = controller.detail(user.user_id, id).await?;
    Ok(Json(booking))
}

async fn update_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBookingRequest>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let controller = BookingController::new(&state);
    let booking = controller.update(user.user_id, id, request).await?;

    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Booking updated successfully".to_string(),
    )))
}

async fn cancel_booking(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BookingResponse>>> {
    let controller = BookingController::new(&state);
    let booking = controller.cancel(user.user_id, id).await?;

    Ok(Json(ApiResponse::success_with_message(
        booking,
        "Booking cancelled successfully".to_string(),
    )))
}
