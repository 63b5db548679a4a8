//! Shared types for the table booking service
//!
//! Domain models, error codes, the response envelope and small utilities
//! used by the server crate and its tests.

pub mod client;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
