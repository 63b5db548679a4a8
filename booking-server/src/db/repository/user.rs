//! User Repository

use super::{RepoError, RepoResult, role};
use shared::error::ErrorCode;
use shared::models::{User, UserCreate, UserStatus};
use sqlx::{SqliteExecutor, SqlitePool};

/// Row only; `roles` is left empty
pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, full_name, email, phone, status, created_at FROM app_user WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(user)
}

pub async fn exists<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM app_user WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

/// User with roles loaded
pub async fn find_by_username(pool: &SqlitePool, username: &str) -> RepoResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, full_name, email, phone, status, created_at FROM app_user WHERE username = ? LIMIT 1",
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    match user {
        Some(mut user) => {
            user.roles = role::find_names_by_user(pool, user.id).await?;
            Ok(Some(user))
        }
        None => Ok(None),
    }
}

/// Insert a user and link its roles in one transaction
pub async fn create(pool: &SqlitePool, data: UserCreate) -> RepoResult<User> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;

    let mut user = sqlx::query_as::<_, User>(
        "INSERT INTO app_user (id, username, password_hash, full_name, email, phone, status, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id, username, password_hash, full_name, email, phone, status, created_at",
    )
    .bind(id)
    .bind(&data.username)
    .bind(&data.password_hash)
    .bind(&data.full_name)
    .bind(&data.email)
    .bind(&data.phone)
    .bind(UserStatus::Active)
    .bind(now)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => RepoError::Business(
            ErrorCode::UsernameExists,
            format!("Username '{}' already exists", data.username),
        ),
        other => other,
    })?;

    for name in &data.roles {
        let role = role::ensure(&mut tx, *name).await?;
        sqlx::query("INSERT OR IGNORE INTO user_role (user_id, role_id) VALUES (?, ?)")
            .bind(id)
            .bind(role.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    user.roles = data.roles;
    Ok(user)
}

pub async fn set_status<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    status: UserStatus,
) -> RepoResult<()> {
    let result = sqlx::query("UPDATE app_user SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::UserNotFound,
            format!("User {id} not found"),
        ));
    }
    Ok(())
}
