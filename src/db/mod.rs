//! Database connection and repositories

pub mod query_log;
pub mod schema_sync;
pub mod users;

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use query_log::{ExecutedQuery, QueryLog};
pub use users::{CreateUser, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access.
///
/// A handle may be scoped to a [QueryLog]; repositories created from a scoped
/// handle record every statement they execute into that log.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
    log: Option<QueryLog>,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, log: None }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Open (creating if missing) the SQLite database at `url`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {}", url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(Self::get_max_connections())
            .connect_with(options)
            .await
            .context("Failed to open database")?;

        Ok(Self::new(pool))
    }

    /// Single-connection in-memory database. The connection never expires, so
    /// the data lives as long as the pool.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Ok(Self::new(pool))
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Handle sharing this pool that records executed statements into `log`.
    pub fn scoped(&self, log: QueryLog) -> Self {
        Self {
            pool: self.pool.clone(),
            log: Some(log),
        }
    }

    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone(), self.log.clone())
    }
}
