//! Dining Table Repository
//!
//! Owns table occupancy. `reserve` is a compare-and-set on the status
//! column, so at most one writer can take an AVAILABLE table.

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{DiningTable, DiningTableCreate, DiningTableUpdate, TableStatus};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::TableNotFound, format!("Table {id} not found"))
}

fn number_taken(err: RepoError, number: &str) -> RepoError {
    match err {
        RepoError::Duplicate(_) => RepoError::Business(
            ErrorCode::TableNumberExists,
            format!("Table number '{number}' already exists"),
        ),
        other => other,
    }
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DiningTable>> {
    let tables = sqlx::query_as::<_, DiningTable>(
        "SELECT id, table_number, capacity, floor, status FROM dining_table ORDER BY floor, table_number",
    )
    .fetch_all(pool)
    .await?;
    Ok(tables)
}

pub async fn find_by_id<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
) -> RepoResult<Option<DiningTable>> {
    let table = sqlx::query_as::<_, DiningTable>(
        "SELECT id, table_number, capacity, floor, status FROM dining_table WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(table)
}

/// New tables start AVAILABLE on floor 1 unless told otherwise
pub async fn create(pool: &SqlitePool, data: DiningTableCreate) -> RepoResult<DiningTable> {
    let id = shared::util::snowflake_id();
    let floor = data.floor.unwrap_or(1);

    sqlx::query_as::<_, DiningTable>(
        "INSERT INTO dining_table (id, table_number, capacity, floor, status) VALUES (?, ?, ?, ?, ?) RETURNING id, table_number, capacity, floor, status",
    )
    .bind(id)
    .bind(&data.table_number)
    .bind(data.capacity)
    .bind(floor)
    .bind(TableStatus::Available.as_str())
    .fetch_one(pool)
    .await
    .map_err(|e| number_taken(e.into(), &data.table_number))
}

/// Partial update of number, capacity and floor; status is untouched
pub async fn update(pool: &SqlitePool, id: i64, data: DiningTableUpdate) -> RepoResult<DiningTable> {
    let number = data.table_number.clone().unwrap_or_default();
    sqlx::query_as::<_, DiningTable>(
        "UPDATE dining_table SET table_number = COALESCE(?1, table_number), capacity = COALESCE(?2, capacity), floor = COALESCE(?3, floor) WHERE id = ?4 RETURNING id, table_number, capacity, floor, status",
    )
    .bind(data.table_number)
    .bind(data.capacity)
    .bind(data.floor)
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| number_taken(e.into(), &number))?
    .ok_or_else(|| not_found(id))
}

/// Administrative status override, no booking side effects
pub async fn set_status<'e>(
    db: impl SqliteExecutor<'e>,
    id: i64,
    status: TableStatus,
) -> RepoResult<DiningTable> {
    sqlx::query_as::<_, DiningTable>(
        "UPDATE dining_table SET status = ? WHERE id = ? RETURNING id, table_number, capacity, floor, status",
    )
    .bind(status.as_str())
    .bind(id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| not_found(id))
}

/// AVAILABLE -> UNAVAILABLE, atomically.
///
/// Fails with `TableNotFound` when the row is missing and `TableUnavailable`
/// when someone else holds it.
pub async fn reserve(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    let result = sqlx::query("UPDATE dining_table SET status = ? WHERE id = ? AND status = ?")
        .bind(TableStatus::Unavailable.as_str())
        .bind(id)
        .bind(TableStatus::Available.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match find_by_id(&mut *conn, id).await? {
        Some(_) => Err(RepoError::Business(
            ErrorCode::TableUnavailable,
            format!("Table {id} is not available"),
        )),
        None => Err(not_found(id)),
    }
}

/// Back to AVAILABLE. Idempotent; a missing table is not an error.
pub async fn release<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE dining_table SET status = ? WHERE id = ?")
        .bind(TableStatus::Available.as_str())
        .bind(id)
        .execute(db)
        .await?;
    Ok(())
}

/// Delete a table, but only while it is AVAILABLE
pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM dining_table WHERE id = ? AND status = ?")
        .bind(id)
        .bind(TableStatus::Available.as_str())
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match find_by_id(&mut *conn, id).await? {
        Some(_) => Err(RepoError::Business(
            ErrorCode::TableOccupied,
            format!("Table {id} is occupied and cannot be deleted"),
        )),
        None => Err(not_found(id)),
    }
}
