use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::allocation::AllocationCoordinator;
use crate::auth::JwtService;
use crate::core::{Config, Result};
use crate::db::DbService;

/// Shared server state, cloned into every handler
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | pool | SQLite connection pool |
/// | jwt_service | token issuer / verifier |
/// | coordinator | table and booking allocation |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub coordinator: AllocationCoordinator,
}

impl ServerState {
    /// Build state around an already-open pool
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let coordinator = AllocationCoordinator::new(pool.clone(), config.store_timeout());
        Self {
            config,
            pool,
            jwt_service,
            coordinator,
        }
    }

    /// Open the database (creating its directory) and build state
    pub async fn initialize(config: &Config) -> Result<Self> {
        if let Some(parent) = Path::new(&config.database_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let db = DbService::new(&config.database_path, config.db_max_connections).await?;
        Ok(Self::new(config.clone(), db.pool))
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}
