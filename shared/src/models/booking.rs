//! Booking Model

use serde::{Deserialize, Serialize};

/// Booking lifecycle status
///
/// ```text
/// PENDING ──► CONFIRMED ──► COMPLETED
///    │            │
///    └────────────┴──────► CANCELLED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// Older clients send `SERVED`
    #[serde(alias = "SERVED")]
    Completed,
}

impl BookingStatus {
    /// Cancelled and completed bookings never hold a table
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Statuses reachable in one step
    pub fn next_statuses(&self) -> &'static [BookingStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Completed, Self::Cancelled],
            Self::Cancelled | Self::Completed => &[],
        }
    }

    /// Same-status writes are accepted as no-ops.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        *self == next || self.next_statuses().contains(&next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Cancelled => "CANCELLED",
            Self::Completed => "COMPLETED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Booking entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Booking {
    pub id: i64,
    pub customer_name: String,
    pub phone: String,
    pub number_of_people: i32,
    /// Scheduled time (Unix millis)
    pub booking_time: i64,
    pub note: Option<String>,
    pub status: BookingStatus,
    /// At most one table; `None` while queued
    pub table_id: Option<i64>,
    /// Staff user handling the booking
    pub handled_by: Option<i64>,
    pub created_at: i64,
}

impl Booking {
    /// Table this booking currently keeps UNAVAILABLE, if any
    pub fn held_table(&self) -> Option<i64> {
        if self.status.is_terminal() {
            None
        } else {
            self.table_id
        }
    }
}

/// Create booking payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCreate {
    pub customer_name: String,
    pub phone: String,
    pub number_of_people: i32,
    pub booking_time: i64,
    pub note: Option<String>,
    pub table_id: Option<i64>,
    pub handled_by: Option<i64>,
}

/// Update booking payload (absent fields stay unchanged)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingUpdate {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub number_of_people: Option<i32>,
    pub booking_time: Option<i64>,
    pub note: Option<String>,
    pub status: Option<BookingStatus>,
    pub table_id: Option<i64>,
    pub handled_by: Option<i64>,
}

/// Status-only change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingStatusUpdate {
    pub status: BookingStatus,
}

/// Move a booking to another table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableAssignment {
    pub table_id: i64,
}
