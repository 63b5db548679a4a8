//! Allocation Coordinator
//!
//! Keeps table occupancy and bookings consistent. A table is UNAVAILABLE
//! exactly while a non-terminal booking references it.
//!
//! Every operation runs in one SQLite transaction bounded by the store
//! deadline. Any error, or an elapsed deadline, drops the transaction and
//! rolls back every write made so far, including a table reservation.
//! All statements inside an operation go through that transaction's
//! connection.
//!
//! Transactions open with `BEGIN IMMEDIATE`: the write lock is taken up
//! front, so concurrent writers queue on `busy_timeout` instead of failing
//! with a stale read snapshot after their first read.

use std::future::Future;
use std::time::Duration;

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{Booking, BookingCreate, BookingStatus, BookingUpdate};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::db::repository::{RepoError, booking, dining_table, user};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_min, validate_optional_text,
    validate_required_text,
};

#[derive(Clone, Debug)]
pub struct AllocationCoordinator {
    pool: SqlitePool,
    store_timeout: Duration,
}

impl AllocationCoordinator {
    pub fn new(pool: SqlitePool, store_timeout: Duration) -> Self {
        Self {
            pool,
            store_timeout,
        }
    }

    /// Open a write transaction holding the database write lock
    async fn begin(&self) -> AppResult<Transaction<'static, Sqlite>> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(RepoError::from)?;
        Ok(tx)
    }

    /// Run `fut` under the store deadline
    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = AppResult<T>>,
    ) -> AppResult<T> {
        match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.store_timeout.as_millis() as u64,
                    "Store deadline elapsed, transaction rolled back"
                );
                Err(AppError::timeout(format!("{operation} timed out")))
            }
        }
    }

    /// Create a PENDING booking, reserving its table if one is named.
    pub async fn create_booking(&self, payload: BookingCreate) -> AppResult<Booking> {
        validate_create(&payload)?;

        self.bounded("create_booking", async {
            let mut tx = self.begin().await?;

            if let Some(table_id) = payload.table_id {
                dining_table::reserve(&mut tx, table_id).await?;
            }
            if let Some(user_id) = payload.handled_by {
                ensure_user(&mut tx, user_id).await?;
            }
            let created = booking::create(&mut *tx, &payload).await?;

            tx.commit().await.map_err(RepoError::from)?;

            tracing::info!(
                booking_id = created.id,
                table_id = ?created.table_id,
                "Booking created"
            );
            Ok(created)
        })
        .await
    }

    /// Partial update: scalar fields, status, staff and table in one go.
    ///
    /// Moving to another table reserves the new one before releasing the
    /// old one; naming the current table again does not touch the registry.
    pub async fn update_booking(&self, id: i64, payload: BookingUpdate) -> AppResult<Booking> {
        validate_update(&payload)?;

        self.bounded("update_booking", async {
            let mut tx = self.begin().await?;

            let current = load_booking(&mut tx, id).await?;
            let target_status = payload.status.unwrap_or(current.status);
            booking::check_transition(&current, target_status)?;

            if let Some(user_id) = payload.handled_by {
                ensure_user(&mut tx, user_id).await?;
            }

            let mut table_id = current.table_id;
            if let Some(new_table) = payload.table_id
                && Some(new_table) != current.table_id
            {
                if current.status.is_terminal() || target_status.is_terminal() {
                    return Err(AppError::with_message(
                        ErrorCode::BookingFinished,
                        format!("Booking {id} is finished, its table cannot change"),
                    ));
                }
                dining_table::reserve(&mut tx, new_table).await?;
                if let Some(old_table) = current.held_table() {
                    dining_table::release(&mut *tx, old_table).await?;
                }
                table_id = Some(new_table);
            }

            if !current.status.is_terminal()
                && target_status.is_terminal()
                && let Some(held) = table_id
            {
                dining_table::release(&mut *tx, held).await?;
            }

            let updated = Booking {
                id: current.id,
                customer_name: payload
                    .customer_name
                    .map(|s| s.trim().to_string())
                    .unwrap_or(current.customer_name),
                phone: payload
                    .phone
                    .map(|s| s.trim().to_string())
                    .unwrap_or(current.phone),
                number_of_people: payload.number_of_people.unwrap_or(current.number_of_people),
                booking_time: payload.booking_time.unwrap_or(current.booking_time),
                note: payload.note.or(current.note),
                status: target_status,
                table_id,
                handled_by: payload.handled_by.or(current.handled_by),
                created_at: current.created_at,
            };
            booking::update_fields(&mut *tx, &updated).await?;

            tx.commit().await.map_err(RepoError::from)?;

            tracing::info!(
                booking_id = id,
                from_table = ?current.table_id,
                to_table = ?updated.table_id,
                status = %updated.status,
                "Booking updated"
            );
            Ok(updated)
        })
        .await
    }

    /// Move a booking to another table
    pub async fn reassign_table(&self, id: i64, table_id: i64) -> AppResult<Booking> {
        self.update_booking(
            id,
            BookingUpdate {
                table_id: Some(table_id),
                ..Default::default()
            },
        )
        .await
    }

    /// Validated status change; cancelling or completing frees the table
    pub async fn update_status(&self, id: i64, status: BookingStatus) -> AppResult<Booking> {
        self.bounded("update_status", async {
            let mut tx = self.begin().await?;

            let before = load_booking(&mut tx, id).await?;
            let after = booking::set_status(&mut tx, id, status).await?;

            if after.status.is_terminal()
                && let Some(held) = before.held_table()
            {
                dining_table::release(&mut *tx, held).await?;
            }

            tx.commit().await.map_err(RepoError::from)?;

            tracing::info!(
                booking_id = id,
                from = %before.status,
                to = %after.status,
                "Booking status changed"
            );
            Ok(after)
        })
        .await
    }

    /// Delete a table, refused while it is UNAVAILABLE
    pub async fn delete_table(&self, id: i64) -> AppResult<()> {
        self.bounded("delete_table", async {
            let mut tx = self.begin().await?;
            dining_table::delete(&mut tx, id).await?;
            tx.commit().await.map_err(RepoError::from)?;
            tracing::info!(table_id = id, "Table deleted");
            Ok(())
        })
        .await
    }

    /// Delete a booking, freeing the table it still holds
    pub async fn delete_booking(&self, id: i64) -> AppResult<()> {
        self.bounded("delete_booking", async {
            let mut tx = self.begin().await?;

            let current = load_booking(&mut tx, id).await?;
            booking::delete(&mut *tx, id).await?;
            if let Some(held) = current.held_table() {
                dining_table::release(&mut *tx, held).await?;
            }

            tx.commit().await.map_err(RepoError::from)?;

            tracing::info!(booking_id = id, released_table = ?current.held_table(), "Booking deleted");
            Ok(())
        })
        .await
    }
}

async fn load_booking(conn: &mut SqliteConnection, id: i64) -> AppResult<Booking> {
    booking::find_by_id(&mut *conn, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::BookingNotFound, format!("Booking {id} not found"))
    })
}

async fn ensure_user(conn: &mut SqliteConnection, user_id: i64) -> AppResult<()> {
    if user::exists(&mut *conn, user_id).await? {
        return Ok(());
    }
    Err(AppError::with_message(
        ErrorCode::UserNotFound,
        format!("User {user_id} not found"),
    ))
}

fn validate_create(payload: &BookingCreate) -> AppResult<()> {
    validate_required_text(&payload.customer_name, "customer_name", MAX_NAME_LEN)?;
    validate_required_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_min(payload.number_of_people, "number_of_people", 1)?;
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}

fn validate_update(payload: &BookingUpdate) -> AppResult<()> {
    if let Some(name) = &payload.customer_name {
        validate_required_text(name, "customer_name", MAX_NAME_LEN)?;
    }
    if let Some(phone) = &payload.phone {
        validate_required_text(phone, "phone", MAX_SHORT_TEXT_LEN)?;
    }
    if let Some(count) = payload.number_of_people {
        validate_min(count, "number_of_people", 1)?;
    }
    validate_optional_text(&payload.note, "note", MAX_NOTE_LEN)?;
    Ok(())
}
