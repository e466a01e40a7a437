//! Startup schema synchronization
//!
//! Creates the tables this service owns when they are missing. Existing
//! tables are left untouched; there are no column migrations.

use sqlx::SqlitePool;
use tracing::{debug, info};

/// Result of a schema sync operation
#[derive(Debug, Default)]
pub struct SchemaSyncResult {
    pub tables_created: Vec<String>,
}

const TABLES: &[(&str, &str)] = &[(
    "users",
    r#"
    CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE COLLATE NOCASE,
        email TEXT,
        is_superuser INTEGER NOT NULL DEFAULT 0,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )
    "#,
)];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create every missing table
pub async fn sync_schema(pool: &SqlitePool) -> Result<SchemaSyncResult, sqlx::Error> {
    let mut result = SchemaSyncResult::default();

    for (name, ddl) in TABLES {
        if table_exists(pool, name).await? {
            debug!(table = name, "Table already exists");
            continue;
        }
        sqlx::query(ddl).execute(pool).await?;
        info!(table = name, "Created table");
        result.tables_created.push(name.to_string());
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();

        let first = sync_schema(db.pool()).await.unwrap();
        assert_eq!(first.tables_created, vec!["users".to_string()]);

        let second = sync_schema(db.pool()).await.unwrap();
        assert!(second.tables_created.is_empty());
    }
}
