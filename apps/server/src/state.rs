//! Shared application state

use crate::{
    config::Config,
    db::{InMemoryTestStore, PostgresTestStore, TestStore},
    services::{DiagnosticTestService, PagingPolicy},
    Result,
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub enum StoreKind {
    /// Persist records in PostgreSQL.
    Postgres,
    /// Keep records in process memory (tests, local demos).
    InMemory,
}

#[derive(Debug, Clone)]
pub struct AppStateOptions {
    pub store: StoreKind,
}

impl Default for AppStateOptions {
    fn default() -> Self {
        Self {
            store: StoreKind::Postgres,
        }
    }
}

/// Shared application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Present only for the PostgreSQL store.
    pub db_pool: Option<PgPool>,
    pub store: Arc<dyn TestStore>,
    pub test_service: Arc<DiagnosticTestService>,
}

impl AppState {
    /// Initialize the application state
    pub async fn new(config: Config) -> Result<Self> {
        Self::new_with_options(config, AppStateOptions::default()).await
    }

    /// State backed by the in-process store. Never touches the network.
    pub fn in_memory(config: Config) -> Self {
        Self::assemble(Arc::new(config), None, Arc::new(InMemoryTestStore::new()))
    }

    pub async fn new_with_options(config: Config, options: AppStateOptions) -> Result<Self> {
        tracing::info!("Initializing application state...");

        let state = match options.store {
            StoreKind::InMemory => Self::in_memory(config),
            StoreKind::Postgres => {
                let db_pool = create_db_pool(&config).await?;

                if config.database.run_migrations {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("./migrations").run(&db_pool).await?;
                }

                let store = Arc::new(PostgresTestStore::new(db_pool.clone()));
                Self::assemble(Arc::new(config), Some(db_pool), store)
            }
        };

        tracing::info!(
            store = state.store.backend_name(),
            "Application state initialized successfully"
        );

        Ok(state)
    }

    fn assemble(config: Arc<Config>, db_pool: Option<PgPool>, store: Arc<dyn TestStore>) -> Self {
        let paging = PagingPolicy {
            default_limit: config.api.default_page_size,
            max_limit: config.api.max_page_size,
        };
        let test_service = Arc::new(DiagnosticTestService::with_paging(store.clone(), paging));

        Self {
            config,
            db_pool,
            store,
            test_service,
        }
    }

    /// Release store resources. Call once the server has stopped accepting requests.
    pub async fn shutdown(&self) {
        if let Some(pool) = &self.db_pool {
            tracing::info!("Closing database connection pool...");
            pool.close().await;
        }
    }
}

async fn create_db_pool(config: &Config) -> Result<PgPool> {
    tracing::info!("Creating database connection pool...");

    let statement_timeout = config.database.statement_timeout_seconds;
    let lock_timeout = config.database.lock_timeout_seconds;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .min_connections(config.database.pool_min_size)
        .max_connections(config.database.pool_max_size)
        .acquire_timeout(std::time::Duration::from_secs(
            config.database.pool_timeout_seconds,
        ))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                sqlx::query(&format!("SET statement_timeout = '{}s'", statement_timeout))
                    .execute(&mut *conn)
                    .await?;
                sqlx::query(&format!("SET lock_timeout = '{}s'", lock_timeout))
                    .execute(&mut *conn)
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database.url)
        .await
        .map_err(crate::Error::Database)?;

    tracing::info!(
        "Database pool created (min: {}, max: {})",
        config.database.pool_min_size,
        config.database.pool_max_size
    );

    Ok(pool)
}
