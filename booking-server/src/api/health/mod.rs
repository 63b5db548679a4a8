//! Health check API

use axum::{Router, extract::State, routing::get};
use serde::Serialize;
use shared::error::{ApiResponse, AppError, AppResult};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/health", get(health_check))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
    pub database: &'static str,
}

/// GET /api/health
async fn health_check(State(state): State<ServerState>) -> AppResult<ApiResponse<HealthStatus>> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|e| AppError::database(format!("Database unreachable: {e}")))?;

    Ok(ApiResponse::success(HealthStatus {
        status: "ok",
        service: "booking-server",
        version: env!("CARGO_PKG_VERSION"),
        database: "ok",
    }))
}
