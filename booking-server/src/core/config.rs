use crate::auth::JwtConfig;
use crate::core::Result;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 3000 | HTTP port |
/// | DATABASE_PATH | ./data/booking.db | SQLite file |
/// | DB_MAX_CONNECTIONS | 5 | pool size |
/// | STORE_TIMEOUT_MS | 5000 | deadline for one allocation transaction |
/// | REQUEST_TIMEOUT_MS | 30000 | whole-request timeout |
/// | ENVIRONMENT | development | development, staging or production |
/// | CORS_ALLOWED_ORIGIN | http://localhost:3000 | browser origin allowed by CORS |
/// | JWT_SECRET | generated in development | HS512 signing secret, at least 32 chars |
/// | JWT_EXPIRATION_MINUTES | 1440 | token lifetime |
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub database_path: String,
    pub db_max_connections: u32,
    pub store_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// development | staging | production
    pub environment: String,
    pub cors_allowed_origin: String,
    pub jwt: JwtConfig,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let jwt = JwtConfig::from_env(environment == "production")?;

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "./data/booking.db".into()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5),
            store_timeout_ms: std::env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
            environment,
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            jwt,
        })
    }

    /// Fixed configuration with the given JWT secret, used by tests
    pub fn with_jwt_secret(secret: impl Into<String>) -> Self {
        Self {
            http_port: 0,
            database_path: ":memory:".into(),
            db_max_connections: 1,
            store_timeout_ms: 5000,
            request_timeout_ms: 30000,
            environment: "test".into(),
            cors_allowed_origin: "http://localhost:3000".into(),
            jwt: JwtConfig::with_secret(secret),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}
