//! Booking API Handlers
//!
//! Reads go straight to the repository; every write goes through the
//! allocation coordinator so table occupancy follows the booking.

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{Booking, BookingCreate, BookingStatusUpdate, BookingUpdate, TableAssignment};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::booking;

/// GET /api/bookings
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Booking>>> {
    let bookings = booking::find_all(&state.pool).await?;
    Ok(ApiResponse::success(bookings))
}

/// GET /api/bookings/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<Booking>> {
    let found = booking::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::BookingNotFound, format!("Booking {id} not found"))
    })?;
    Ok(ApiResponse::success(found))
}

/// POST /api/bookings
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<BookingCreate>,
) -> AppResult<ApiResponse<Booking>> {
    let created = state.coordinator.create_booking(payload).await?;
    tracing::debug!(booking_id = created.id, by = %user.username, "Create booking request served");
    Ok(ApiResponse::success_with_status(
        StatusCode::CREATED,
        "Booking created",
        created,
    ))
}

/// PUT /api/bookings/{id} - partial update, may move the table or change status
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingUpdate>,
) -> AppResult<ApiResponse<Booking>> {
    let updated = state.coordinator.update_booking(id, payload).await?;
    Ok(ApiResponse::success(updated))
}

/// PATCH /api/bookings/{id} - status only
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<BookingStatusUpdate>,
) -> AppResult<ApiResponse<Booking>> {
    let updated = state.coordinator.update_status(id, payload.status).await?;
    Ok(ApiResponse::success(updated))
}

/// PATCH /api/bookings/{id}/table
pub async fn reassign_table(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(payload): Json<TableAssignment>,
) -> AppResult<ApiResponse<Booking>> {
    let updated = state.coordinator.reassign_table(id, payload.table_id).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/bookings/{id}
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<ApiResponse<()>> {
    state.coordinator.delete_booking(id).await?;
    tracing::info!(booking_id = id, by = %user.username, "Booking removed");
    Ok(ApiResponse::ok("Booking deleted"))
}
