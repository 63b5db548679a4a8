//! Auth API Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use http::StatusCode;
use shared::client::{CurrentUserResponse, LoginRequest, LoginResponse, RegisterRequest, UserInfo};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use shared::models::{RoleName, UserCreate};

use crate::auth::CurrentUser;
use crate::auth::password::{DUMMY_HASH, spawn_hash_password, spawn_verify_password};
use crate::core::ServerState;
use crate::db::repository::user;
use crate::utils::validation::{
    MAX_EMAIL_LEN, MAX_NAME_LEN, MAX_PASSWORD_LEN, MAX_SHORT_TEXT_LEN, validate_optional_text,
    validate_required_text,
};

/// Every login answer takes at least this long, found or not
const AUTH_FIXED_DELAY_MS: u64 = 300;

/// POST /api/auth/register - self-service signup, always with the USER role
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<ApiResponse<UserInfo>> {
    validate_required_text(&req.username, "username", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&req.password, "password", MAX_PASSWORD_LEN)?;
    validate_required_text(&req.email, "email", MAX_EMAIL_LEN)?;
    validate_optional_text(&req.full_name, "full_name", MAX_NAME_LEN)?;
    validate_optional_text(&req.phone, "phone", MAX_SHORT_TEXT_LEN)?;

    let username = req.username.trim().to_string();
    if user::find_by_username(&state.pool, &username).await?.is_some() {
        return Err(AppError::with_message(
            ErrorCode::UsernameExists,
            format!("Username '{username}' already exists"),
        ));
    }

    let created = user::create(
        &state.pool,
        UserCreate {
            username,
            password_hash: spawn_hash_password(req.password).await?,
            full_name: req.full_name,
            email: Some(req.email.trim().to_string()),
            phone: req.phone,
            roles: vec![RoleName::User],
        },
    )
    .await?;

    tracing::info!(user_id = created.id, username = %created.username, "User registered");

    Ok(ApiResponse::success_with_status(
        StatusCode::CREATED,
        "User registered",
        UserInfo::from(&created),
    ))
}

/// POST /api/auth/login
///
/// Unknown user and wrong password give the same answer, after the same
/// work: one argon2 check (against [`DUMMY_HASH`] for unknown users) plus a
/// fixed delay.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let username = req.username.trim().to_string();
    let found = user::find_by_username(&state.pool, &username).await?;

    let stored_hash = found
        .as_ref()
        .map_or_else(|| DUMMY_HASH.to_string(), |u| u.password_hash.clone());
    let password_ok = spawn_verify_password(req.password, stored_hash).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let account = match found {
        Some(u) if password_ok => u,
        Some(_) => {
            tracing::warn!(username = %username, "Login failed - invalid credentials");
            return Err(AppError::invalid_credentials());
        }
        None => {
            tracing::warn!(username = %username, "Login failed - user not found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !account.is_active() {
        tracing::warn!(username = %username, "Login refused - account disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let token = state
        .get_jwt_service()
        .issue(account.id, &account.username, &account.roles)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    tracing::info!(user_id = account.id, username = %account.username, "User logged in");

    Ok(ApiResponse::success(LoginResponse {
        token,
        user: UserInfo::from(&account),
    }))
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> AppResult<ApiResponse<CurrentUserResponse>> {
    Ok(ApiResponse::success(CurrentUserResponse {
        id: user.id,
        username: user.username,
        roles: user.roles,
    }))
}
