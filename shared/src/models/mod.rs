//! Data models
//!
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, all timestamps Unix millis.

pub mod booking;
pub mod dining_table;
pub mod role;
pub mod user;

// Re-exports
pub use booking::*;
pub use dining_table::*;
pub use role::*;
pub use user::*;
