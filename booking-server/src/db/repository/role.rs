//! Role Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Role, RoleName};
use sqlx::{SqliteConnection, SqliteExecutor};

pub async fn find_by_name<'e>(db: impl SqliteExecutor<'e>, name: RoleName) -> RepoResult<Option<Role>> {
    let role = sqlx::query_as::<_, Role>("SELECT id, name FROM role WHERE name = ? LIMIT 1")
        .bind(name.as_str())
        .fetch_optional(db)
        .await?;
    Ok(role)
}

/// Look up a role by name, creating it if missing.
///
/// The insert is a no-op on conflict, so concurrent callers converge on
/// the same row.
pub async fn ensure(conn: &mut SqliteConnection, name: RoleName) -> RepoResult<Role> {
    sqlx::query("INSERT INTO role (id, name) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
        .bind(shared::util::snowflake_id())
        .bind(name.as_str())
        .execute(&mut *conn)
        .await?;

    find_by_name(&mut *conn, name).await?.ok_or_else(|| {
        RepoError::Business(ErrorCode::RoleNotFound, format!("Role {name} not found"))
    })
}

/// Role names held by a user
pub async fn find_names_by_user<'e>(
    db: impl SqliteExecutor<'e>,
    user_id: i64,
) -> RepoResult<Vec<RoleName>> {
    let names = sqlx::query_scalar::<_, RoleName>(
        "SELECT r.name FROM role r JOIN user_role ur ON ur.role_id = r.id WHERE ur.user_id = ? ORDER BY r.name DESC",
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;

    #[tokio::test]
    async fn ensure_is_idempotent() {
        let pool = test_support::pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let first = ensure(&mut conn, RoleName::User).await.unwrap();
        let second = ensure(&mut conn, RoleName::User).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, RoleName::User);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM role")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn missing_role_is_none() {
        let pool = test_support::pool().await;
        assert!(find_by_name(&pool, RoleName::Admin).await.unwrap().is_none());
    }
}
