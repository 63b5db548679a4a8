//! Table booking server
//!
//! ```text
//! booking-server/src/
//! ├── core/          # config, state, server, errors
//! ├── auth/          # JWT issuing, password hashing, middleware
//! ├── db/            # SQLite pool and repositories
//! ├── allocation/    # keeps tables and bookings consistent
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation
//! ```

pub mod allocation;
pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

pub use allocation::AllocationCoordinator;
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
