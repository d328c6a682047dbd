/**
 * Store Selection
 *
 * Picks the persistence backend from the loaded configuration:
 *
 * - `DATABASE_URL` set: connect a Postgres pool and run the embedded
 *   migrations. A configured but unreachable database is a startup error.
 * - `DATABASE_URL` unset: fall back to the in-memory store. Data is lost on
 *   restart, so this is logged as a warning.
 */

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::backend::error::{BackendError, BackendResult};
use crate::backend::store::{ChatStore, MemoryStore, PgStore, UserStore};
use crate::shared::AppConfig;

const MAX_DB_CONNECTIONS: u32 = 10;

/// Both store roles, backed by the same implementation
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub chats: Arc<dyn ChatStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            chats: store,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            chats: store,
        }
    }
}

/// Open the configured store
pub async fn load_stores(config: &AppConfig) -> BackendResult<Stores> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; data will not survive a restart.");
        return Ok(Stores::memory());
    };

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(MAX_DB_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            BackendError::internal(format!("Database connection failed: {}", e))
        })?;
    tracing::info!("Database connection pool created successfully");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
        tracing::error!("Failed to run database migrations: {}", e);
        BackendError::internal(format!("Migration failed: {}", e))
    })?;
    tracing::info!("Database migrations completed successfully");

    Ok(Stores::postgres(PgStore::new(pool)))
}
