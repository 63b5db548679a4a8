//! Table allocation across the booking lifecycle
//!
//! Most cases run the coordinator against a private in-memory database.
//! The contention cases use a file-backed WAL database with several
//! connections on a multi-threaded runtime.

use std::time::Duration;

use booking_server::AllocationCoordinator;
use booking_server::db::DbService;
use booking_server::db::repository::{booking, dining_table, user};
use shared::error::ErrorCode;
use shared::models::{
    BookingCreate, BookingStatus, BookingUpdate, DiningTable, DiningTableCreate, RoleName,
    TableStatus, UserCreate,
};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tokio::task::JoinSet;

async fn setup() -> (SqlitePool, AllocationCoordinator) {
    let pool = DbService::in_memory().await.unwrap().pool;
    let coordinator = AllocationCoordinator::new(pool.clone(), Duration::from_secs(5));
    (pool, coordinator)
}

/// File-backed pool with real concurrency; keep the `TempDir` alive
async fn setup_file_backed() -> (TempDir, SqlitePool, AllocationCoordinator) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("booking.db");
    let pool = DbService::new(path.to_str().unwrap(), 5)
        .await
        .unwrap()
        .pool;
    let coordinator = AllocationCoordinator::new(pool.clone(), Duration::from_secs(30));
    (dir, pool, coordinator)
}

async fn add_table(pool: &SqlitePool, number: &str) -> DiningTable {
    dining_table::create(
        pool,
        DiningTableCreate {
            table_number: number.to_string(),
            capacity: 4,
            floor: None,
        },
    )
    .await
    .unwrap()
}

async fn table_status(pool: &SqlitePool, id: i64) -> TableStatus {
    dining_table::find_by_id(pool, id)
        .await
        .unwrap()
        .expect("table should exist")
        .status
}

/// At most one live booking holds the table, and the table is UNAVAILABLE
/// exactly while one does
async fn assert_exclusive(pool: &SqlitePool, table_id: i64) {
    let active = booking::find_active_by_table(pool, table_id).await.unwrap();
    assert!(
        active.len() <= 1,
        "table {table_id} is held by {} bookings",
        active.len()
    );
    let expected = if active.is_empty() {
        TableStatus::Available
    } else {
        TableStatus::Unavailable
    };
    assert_eq!(table_status(pool, table_id).await, expected);
}

async fn booking_count(pool: &SqlitePool) -> usize {
    booking::find_all(pool).await.unwrap().len()
}

fn request(table_id: Option<i64>) -> BookingCreate {
    BookingCreate {
        customer_name: "Hana".into(),
        phone: "555-0199".into(),
        number_of_people: 2,
        booking_time: 1_760_000_000_000,
        note: None,
        table_id,
        handled_by: None,
    }
}

#[tokio::test]
async fn create_reserves_the_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    assert_eq!(created.status, BookingStatus::Pending);
    assert_eq!(created.table_id, Some(t1.id));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);
    assert_exclusive(&pool, t1.id).await;
}

#[tokio::test]
async fn create_without_table_leaves_registry_alone() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let created = coordinator.create_booking(request(None)).await.unwrap();

    assert!(created.table_id.is_none());
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
}

#[tokio::test]
async fn concurrent_creates_have_one_winner() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let coordinator = coordinator.clone();
        tasks.spawn(async move { coordinator.create_booking(request(Some(t1.id))).await });
    }

    let mut won = 0;
    let mut lost = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => won += 1,
            Err(e) => {
                assert_eq!(e.code, ErrorCode::TableUnavailable);
                lost += 1;
            }
        }
    }

    assert_eq!(won, 1);
    assert_eq!(lost, 7);
    assert_eq!(booking_count(&pool).await, 1);
    assert_exclusive(&pool, t1.id).await;
}

#[tokio::test]
async fn missing_table_creates_nothing() {
    let (pool, coordinator) = setup().await;

    let err = coordinator.create_booking(request(Some(424242))).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::TableNotFound);
    assert_eq!(booking_count(&pool).await, 0);
}

#[tokio::test]
async fn unavailable_table_creates_nothing() {
    let (pool, coordinator) = setup().await;
    let t3 = add_table(&pool, "T3").await;
    dining_table::set_status(&pool, t3.id, TableStatus::Unavailable)
        .await
        .unwrap();

    let err = coordinator.create_booking(request(Some(t3.id))).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::TableUnavailable);
    assert_eq!(err.http_status(), http::StatusCode::CONFLICT);
    assert_eq!(booking_count(&pool).await, 0);
}

#[tokio::test]
async fn failed_create_rolls_back_the_reservation() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let mut req = request(Some(t1.id));
    req.handled_by = Some(987654321);
    let err = coordinator.create_booking(req).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::UserNotFound);
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
    assert_eq!(booking_count(&pool).await, 0);
    assert_exclusive(&pool, t1.id).await;
}

#[tokio::test]
async fn create_with_known_staff() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let staff = user::create(
        &pool,
        UserCreate {
            username: "host".into(),
            password_hash: "$argon2id$v=19$unused".into(),
            full_name: None,
            email: None,
            phone: None,
            roles: vec![RoleName::User],
        },
    )
    .await
    .unwrap();

    let mut req = request(Some(t1.id));
    req.handled_by = Some(staff.id);
    let created = coordinator.create_booking(req).await.unwrap();

    assert_eq!(created.handled_by, Some(staff.id));
}

#[tokio::test]
async fn invalid_payload_is_rejected_before_reserving() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let mut req = request(Some(t1.id));
    req.number_of_people = 0;
    let err = coordinator.create_booking(req).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    let mut req = request(Some(t1.id));
    req.customer_name = "   ".into();
    let err = coordinator.create_booking(req).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);

    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
}

#[tokio::test]
async fn move_then_delete_the_old_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let t2 = add_table(&pool, "T2").await;

    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);
    assert_exclusive(&pool, t1.id).await;
    assert_exclusive(&pool, t2.id).await;

    let moved = coordinator
        .update_booking(
            created.id,
            BookingUpdate {
                table_id: Some(t2.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(moved.table_id, Some(t2.id));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
    assert_eq!(table_status(&pool, t2.id).await, TableStatus::Unavailable);
    assert_exclusive(&pool, t1.id).await;
    assert_exclusive(&pool, t2.id).await;

    coordinator.delete_table(t1.id).await.unwrap();
    assert!(dining_table::find_by_id(&pool, t1.id).await.unwrap().is_none());
    assert_exclusive(&pool, t2.id).await;
}

#[tokio::test]
async fn naming_the_same_table_is_a_no_op() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    let same = coordinator.reassign_table(created.id, t1.id).await.unwrap();

    assert_eq!(same.table_id, Some(t1.id));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);
}

#[tokio::test]
async fn move_to_busy_table_keeps_the_old_one() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let t2 = add_table(&pool, "T2").await;

    let first = coordinator.create_booking(request(Some(t1.id))).await.unwrap();
    coordinator.create_booking(request(Some(t2.id))).await.unwrap();

    let err = coordinator.reassign_table(first.id, t2.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableUnavailable);

    let reloaded = booking::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert_eq!(reloaded.table_id, Some(t1.id));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);
    assert_exclusive(&pool, t1.id).await;
    assert_exclusive(&pool, t2.id).await;
}

#[tokio::test]
async fn queued_booking_can_take_a_table_later() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;

    let queued = coordinator.create_booking(request(None)).await.unwrap();
    let seated = coordinator.reassign_table(queued.id, t1.id).await.unwrap();

    assert_eq!(seated.table_id, Some(t1.id));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);
}

#[tokio::test]
async fn cancelling_frees_the_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    let cancelled = coordinator
        .update_status(created.id, BookingStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
    assert_exclusive(&pool, t1.id).await;

    // the freed table can be booked again
    coordinator.create_booking(request(Some(t1.id))).await.unwrap();
    assert_exclusive(&pool, t1.id).await;
}

#[tokio::test]
async fn completing_through_update_frees_the_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    coordinator
        .update_status(created.id, BookingStatus::Confirmed)
        .await
        .unwrap();
    let done = coordinator
        .update_booking(
            created.id,
            BookingUpdate {
                status: Some(BookingStatus::Completed),
                note: Some("left a tip".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(done.status, BookingStatus::Completed);
    assert_eq!(done.note.as_deref(), Some("left a tip"));
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
}

#[tokio::test]
async fn invalid_transitions_change_nothing() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    let err = coordinator
        .update_status(created.id, BookingStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingInvalidTransition);
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Unavailable);

    coordinator
        .update_status(created.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    let err = coordinator
        .update_status(created.id, BookingStatus::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingInvalidTransition);

    let err = coordinator
        .update_status(31337, BookingStatus::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingNotFound);
}

#[tokio::test]
async fn finished_booking_cannot_change_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let t2 = add_table(&pool, "T2").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();
    coordinator
        .update_status(created.id, BookingStatus::Cancelled)
        .await
        .unwrap();

    let err = coordinator.reassign_table(created.id, t2.id).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::BookingFinished);
    assert_eq!(table_status(&pool, t2.id).await, TableStatus::Available);
}

#[tokio::test]
async fn occupied_table_cannot_be_deleted() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    let err = coordinator.delete_table(t1.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableOccupied);
    assert!(dining_table::find_by_id(&pool, t1.id).await.unwrap().is_some());

    let err = coordinator.delete_table(55555).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::TableNotFound);
}

#[tokio::test]
async fn deleting_a_booking_frees_its_table() {
    let (pool, coordinator) = setup().await;
    let t1 = add_table(&pool, "T1").await;
    let created = coordinator.create_booking(request(Some(t1.id))).await.unwrap();

    coordinator.delete_booking(created.id).await.unwrap();

    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
    assert_exclusive(&pool, t1.id).await;
    assert_eq!(booking_count(&pool).await, 0);

    let err = coordinator.delete_booking(created.id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::BookingNotFound);
}

#[tokio::test]
async fn store_deadline_gives_timeout() {
    let (pool, _) = setup().await;
    let coordinator = AllocationCoordinator::new(pool.clone(), Duration::from_millis(50));
    let t1 = add_table(&pool, "T1").await;

    // hold the only connection so the transaction cannot begin
    let held = pool.acquire().await.unwrap();
    let err = coordinator.create_booking(request(Some(t1.id))).await.unwrap_err();
    drop(held);

    assert_eq!(err.code, ErrorCode::TimeoutError);
    assert_eq!(table_status(&pool, t1.id).await, TableStatus::Available);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contended_creates_on_one_table_have_one_winner() {
    let (_dir, pool, coordinator) = setup_file_backed().await;
    let t1 = add_table(&pool, "T1").await;

    let mut tasks = JoinSet::new();
    for _ in 0..20 {
        let coordinator = coordinator.clone();
        tasks.spawn(async move { coordinator.create_booking(request(Some(t1.id))).await });
    }

    let mut won = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined.unwrap() {
            Ok(_) => won += 1,
            Err(e) => assert_eq!(e.code, ErrorCode::TableUnavailable, "{e}"),
        }
    }

    assert_eq!(won, 1);
    assert_eq!(booking_count(&pool).await, 1);
    assert_exclusive(&pool, t1.id).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_on_separate_bookings_all_succeed() {
    let (_dir, pool, coordinator) = setup_file_backed().await;

    let mut tables = Vec::new();
    let mut spares = Vec::new();
    let mut bookings = Vec::new();
    for i in 0..30 {
        let table = add_table(&pool, &format!("T{i}")).await;
        spares.push(add_table(&pool, &format!("S{i}")).await);
        let created = coordinator
            .create_booking(request(Some(table.id)))
            .await
            .unwrap();
        bookings.push(created.id);
        tables.push(table);
    }

    let mut tasks = JoinSet::new();
    for (i, booking_id) in bookings.iter().copied().enumerate() {
        let coordinator = coordinator.clone();
        let spare = spares[i].id;
        tasks.spawn(async move {
            match i % 4 {
                0 => coordinator
                    .update_status(booking_id, BookingStatus::Cancelled)
                    .await
                    .map(|_| ()),
                1 => coordinator
                    .reassign_table(booking_id, spare)
                    .await
                    .map(|_| ()),
                2 => coordinator
                    .update_booking(
                        booking_id,
                        BookingUpdate {
                            status: Some(BookingStatus::Confirmed),
                            number_of_people: Some(4),
                            ..Default::default()
                        },
                    )
                    .await
                    .map(|_| ()),
                _ => coordinator.delete_booking(booking_id).await,
            }
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined.unwrap() {
            panic!("unrelated write failed: {e} ({})", e.code);
        }
    }

    for table in tables.iter().chain(spares.iter()) {
        assert_exclusive(&pool, table.id).await;
    }
    for (i, table) in tables.iter().enumerate() {
        let expected = if i % 4 == 2 {
            TableStatus::Unavailable
        } else {
            TableStatus::Available
        };
        assert_eq!(table_status(&pool, table.id).await, expected);
    }
    // every fourth booking was deleted
    assert_eq!(booking_count(&pool).await, 23);
}
