//! Authentication and authorization
//!
//! - [`JwtService`] - token issuer / verifier
//! - [`CurrentUser`] - principal decoded from the bearer token
//! - [`require_auth`] - authentication middleware
//! - [`require_role`] - role gate middleware
//! - [`password`] - argon2 hashing

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_auth, require_role};

/// Roles allowed to create and change bookings
pub const STAFF_ROLES: &[&str] = &["USER", "ADMIN"];

/// Roles allowed to manage tables and delete bookings
pub const ADMIN_ROLES: &[&str] = &["ADMIN"];
