//! Dining Table API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use http::StatusCode;
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::dining_table;
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_min, validate_required_text};

/// GET /api/tables
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<DiningTable>>> {
    let tables = dining_table::find_all(&state.pool).await?;
    Ok(ApiResponse::success(tables))
}

/// GET /api/tables/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = dining_table::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::TableNotFound, format!("Table {id} not found"))
        })?;
    Ok(ApiResponse::success(table))
}

/// POST /api/tables
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(mut payload): Json<DiningTableCreate>,
) -> AppResult<ApiResponse<DiningTable>> {
    validate_required_text(&payload.table_number, "table_number", MAX_SHORT_TEXT_LEN)?;
    validate_min(payload.capacity, "capacity", 1)?;
    payload.table_number = payload.table_number.trim().to_string();

    let table = dining_table::create(&state.pool, payload).await?;
    tracing::info!(table_id = table.id, number = %table.table_number, by = %user.username, "Table created");

    Ok(ApiResponse::success_with_status(
        StatusCode::CREATED,
        "Table created",
        table,
    ))
}

/// PUT /api/tables/{id} - partial update of number, capacity, floor
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Json(mut payload): Json<DiningTableUpdate>,
) -> AppResult<ApiResponse<DiningTable>> {
    if let Some(number) = payload.table_number.take() {
        validate_required_text(&number, "table_number", MAX_SHORT_TEXT_LEN)?;
        payload.table_number = Some(number.trim().to_string());
    }
    if let Some(capacity) = payload.capacity {
        validate_min(capacity, "capacity", 1)?;
    }

    let table = dining_table::update(&state.pool, id, payload).await?;
    Ok(ApiResponse::success(table))
}

/// PATCH /api/tables/{id} - administrative status override
pub async fn set_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    Json(payload): Json<TableStatusUpdate>,
) -> AppResult<ApiResponse<DiningTable>> {
    let table = dining_table::set_status(&state.pool, id, payload.status).await?;
    tracing::warn!(table_id = id, status = payload.status.as_str(), by = %user.username, "Table status overridden");
    Ok(ApiResponse::success(table))
}

/// DELETE /api/tables/{id} - only while AVAILABLE
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<()>> {
    state.coordinator.delete_table(id).await?;
    Ok(ApiResponse::ok("Table deleted"))
}
