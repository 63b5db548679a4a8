//! Booking Repository
//!
//! Owns the booking rows and their status progression. Nothing here touches
//! table occupancy; the allocation coordinator pairs these calls with the
//! table registry inside one transaction.

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Booking, BookingCreate, BookingStatus};
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};

fn not_found(id: i64) -> RepoError {
    RepoError::Business(ErrorCode::BookingNotFound, format!("Booking {id} not found"))
}

/// Reject any status change outside the lifecycle graph
pub fn check_transition(booking: &Booking, next: BookingStatus) -> RepoResult<()> {
    if booking.status.can_transition_to(next) {
        return Ok(());
    }
    Err(RepoError::Business(
        ErrorCode::BookingInvalidTransition,
        format!(
            "Booking {} cannot move from {} to {}",
            booking.id, booking.status, next
        ),
    ))
}

/// All bookings, soonest first
pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT id, customer_name, phone, number_of_people, booking_time, note, status, table_id, handled_by, created_at FROM booking ORDER BY booking_time, id",
    )
    .fetch_all(pool)
    .await?;
    Ok(bookings)
}

pub async fn find_by_id<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        "SELECT id, customer_name, phone, number_of_people, booking_time, note, status, table_id, handled_by, created_at FROM booking WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(booking)
}

/// Non-terminal bookings referencing a table
pub async fn find_active_by_table<'e>(
    db: impl SqliteExecutor<'e>,
    table_id: i64,
) -> RepoResult<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT id, customer_name, phone, number_of_people, booking_time, note, status, table_id, handled_by, created_at FROM booking WHERE table_id = ? AND status IN ('PENDING', 'CONFIRMED') ORDER BY booking_time",
    )
    .bind(table_id)
    .fetch_all(db)
    .await?;
    Ok(bookings)
}

/// Insert a PENDING booking
pub async fn create<'e>(db: impl SqliteExecutor<'e>, data: &BookingCreate) -> RepoResult<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        "INSERT INTO booking (id, customer_name, phone, number_of_people, booking_time, note, status, table_id, handled_by, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id, customer_name, phone, number_of_people, booking_time, note, status, table_id, handled_by, created_at",
    )
    .bind(shared::util::snowflake_id())
    .bind(data.customer_name.trim())
    .bind(data.phone.trim())
    .bind(data.number_of_people)
    .bind(data.booking_time)
    .bind(&data.note)
    .bind(BookingStatus::Pending)
    .bind(data.table_id)
    .bind(data.handled_by)
    .bind(shared::util::now_millis())
    .fetch_one(db)
    .await?;
    Ok(booking)
}

/// Persist every mutable column of an already-resolved booking
pub async fn update_fields<'e>(db: impl SqliteExecutor<'e>, booking: &Booking) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE booking SET customer_name = ?, phone = ?, number_of_people = ?, booking_time = ?, note = ?, status = ?, table_id = ?, handled_by = ? WHERE id = ?",
    )
    .bind(&booking.customer_name)
    .bind(&booking.phone)
    .bind(booking.number_of_people)
    .bind(booking.booking_time)
    .bind(&booking.note)
    .bind(booking.status)
    .bind(booking.table_id)
    .bind(booking.handled_by)
    .bind(booking.id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(booking.id));
    }
    Ok(())
}

/// Validated status change. Writing the current status again is a no-op.
pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: BookingStatus,
) -> RepoResult<Booking> {
    let mut booking = find_by_id(&mut *conn, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    check_transition(&booking, status)?;
    if booking.status == status {
        return Ok(booking);
    }

    sqlx::query("UPDATE booking SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    booking.status = status;
    Ok(booking)
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, id: i64) -> RepoResult<()> {
    let result = sqlx::query("DELETE FROM booking WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support;

    fn payload(table_id: Option<i64>) -> BookingCreate {
        BookingCreate {
            customer_name: "  Mei  ".into(),
            phone: "555-0101".into(),
            number_of_people: 3,
            booking_time: 1_700_000_000_000,
            note: Some("birthday".into()),
            table_id,
            handled_by: None,
        }
    }

    #[tokio::test]
    async fn create_is_pending_and_trimmed() {
        let pool = test_support::pool().await;
        let booking = create(&pool, &payload(None)).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.customer_name, "Mei");
        assert!(booking.table_id.is_none());

        let loaded = find_by_id(&pool, booking.id).await.unwrap().unwrap();
        assert_eq!(loaded.note.as_deref(), Some("birthday"));
    }

    #[tokio::test]
    async fn set_status_follows_graph() {
        let pool = test_support::pool().await;
        let booking = create(&pool, &payload(None)).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();

        let err = set_status(&mut conn, booking.id, BookingStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Business(ErrorCode::BookingInvalidTransition, _)
        ));

        let b = set_status(&mut conn, booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(b.status, BookingStatus::Confirmed);

        // same status again is accepted
        set_status(&mut conn, booking.id, BookingStatus::Confirmed)
            .await
            .unwrap();

        let b = set_status(&mut conn, booking.id, BookingStatus::Completed)
            .await
            .unwrap();
        assert_eq!(b.status, BookingStatus::Completed);

        let err = set_status(&mut conn, booking.id, BookingStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RepoError::Business(ErrorCode::BookingInvalidTransition, _)
        ));
    }

    #[tokio::test]
    async fn active_by_table_skips_terminal() {
        let pool = test_support::pool().await;
        let a = create(&pool, &payload(Some(7))).await.unwrap();
        let b = create(&pool, &payload(Some(7))).await.unwrap();
        let mut conn = pool.acquire().await.unwrap();
        set_status(&mut conn, b.id, BookingStatus::Cancelled)
            .await
            .unwrap();

        let active = find_active_by_table(&mut *conn, 7).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);
    }

    #[tokio::test]
    async fn update_and_delete_missing() {
        let pool = test_support::pool().await;
        let mut booking = create(&pool, &payload(None)).await.unwrap();
        booking.number_of_people = 5;
        update_fields(&pool, &booking).await.unwrap();
        assert_eq!(
            find_by_id(&pool, booking.id)
                .await
                .unwrap()
                .unwrap()
                .number_of_people,
            5
        );

        delete(&pool, booking.id).await.unwrap();
        let err = delete(&pool, booking.id).await.unwrap_err();
        assert!(matches!(err, RepoError::Business(ErrorCode::BookingNotFound, _)));
    }
}
