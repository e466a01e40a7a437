//! Users repository
//!
//! Only what the GraphQL layer needs: the superuser fallback lookup, batched
//! loads for the DataLoader, and the handful of account operations exposed
//! by the built-in `accounts` app.

use std::time::Instant;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::QueryLog;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: Option<String>,
    pub is_superuser: bool,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub is_superuser: bool,
}

type UserRow = (i64, String, Option<String>, i32, i32, String);

const USER_COLUMNS: &str = "id, username, email, is_superuser, is_active, created_at";

fn row_to_record(r: UserRow) -> UserRecord {
    UserRecord {
        id: r.0,
        username: r.1,
        email: r.2,
        is_superuser: r.3 != 0,
        is_active: r.4 != 0,
        created_at: r.5,
    }
}

pub struct UsersRepository {
    pool: SqlitePool,
    log: Option<QueryLog>,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool, log: Option<QueryLog>) -> Self {
        Self { pool, log }
    }

    fn record(&self, sql: &str, started: Instant) {
        if let Some(log) = &self.log {
            log.record(sql, started.elapsed());
        }
    }

    /// Create a new user
    pub async fn create(&self, user: CreateUser) -> Result<UserRecord> {
        let sql = "INSERT INTO users (username, email, is_superuser, is_active, created_at) VALUES (?, ?, ?, 1, ?)";
        let started = Instant::now();
        let result = sqlx::query(sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(user.is_superuser as i32)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await;
        self.record(sql, started);

        let id = result?.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to create user"))
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let started = Instant::now();
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        self.record(&sql, started);

        Ok(row?.map(row_to_record))
    }

    /// Get every user whose ID is in `ids`, in a single statement
    pub async fn get_by_ids(&self, ids: &[i64]) -> Result<Vec<UserRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (1..=ids.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "SELECT {} FROM users WHERE id IN ({}) ORDER BY id",
            USER_COLUMNS,
            placeholders.join(", ")
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql);
        for id in ids {
            query = query.bind(*id);
        }

        let started = Instant::now();
        let rows = query.fetch_all(&self.pool).await;
        self.record(&sql, started);

        Ok(rows?.into_iter().map(row_to_record).collect())
    }

    /// The superuser with the lowest primary key, if any
    pub async fn first_superuser(&self) -> Result<Option<UserRecord>> {
        let sql = format!(
            "SELECT {} FROM users WHERE is_superuser = 1 ORDER BY id LIMIT 1",
            USER_COLUMNS
        );
        let started = Instant::now();
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_optional(&self.pool)
            .await;
        self.record(&sql, started);

        Ok(row?.map(row_to_record))
    }

    /// List all users
    pub async fn list_all(&self) -> Result<Vec<UserRecord>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let started = Instant::now();
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await;
        self.record(&sql, started);

        Ok(rows?.into_iter().map(row_to_record).collect())
    }

    /// Grant or revoke superuser status. Returns `None` if the user does not exist.
    pub async fn set_superuser(&self, id: i64, value: bool) -> Result<Option<UserRecord>> {
        let sql = "UPDATE users SET is_superuser = ? WHERE id = ?";
        let started = Instant::now();
        let result = sqlx::query(sql)
            .bind(value as i32)
            .bind(id)
            .execute(&self.pool)
            .await;
        self.record(sql, started);

        if result?.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, schema_sync};
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        let db = Database::connect_in_memory().await.unwrap();
        schema_sync::sync_schema(db.pool()).await.unwrap();
        db
    }

    fn user(name: &str, is_superuser: bool) -> CreateUser {
        CreateUser {
            username: name.to_string(),
            email: None,
            is_superuser,
        }
    }

    #[tokio::test]
    async fn test_first_superuser_is_lowest_id() {
        let db = setup().await;
        let users = db.users();
        users.create(user("alice", false)).await.unwrap();
        let bob = users.create(user("bob", true)).await.unwrap();
        users.create(user("carol", true)).await.unwrap();

        let first = users.first_superuser().await.unwrap().unwrap();
        assert_eq!(first.id, bob.id);
        assert_eq!(first.username, "bob");
    }

    #[tokio::test]
    async fn test_first_superuser_none() {
        let db = setup().await;
        db.users().create(user("alice", false)).await.unwrap();

        assert!(db.users().first_superuser().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_ids_skips_missing() {
        let db = setup().await;
        let users = db.users();
        let a = users.create(user("a", false)).await.unwrap();
        let b = users.create(user("b", false)).await.unwrap();

        let found = users.get_by_ids(&[b.id, 999, a.id]).await.unwrap();
        let names: Vec<_> = found.into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_set_superuser() {
        let db = setup().await;
        let users = db.users();
        let a = users.create(user("a", false)).await.unwrap();

        let updated = users.set_superuser(a.id, true).await.unwrap().unwrap();
        assert!(updated.is_superuser);
        assert!(users.set_superuser(42, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scoped_handle_records_statements() {
        let db = setup().await;
        let log = QueryLog::new();
        let scoped = db.scoped(log.clone());

        scoped.users().first_superuser().await.unwrap();
        scoped.users().list_all().await.unwrap();
        db.users().list_all().await.unwrap();

        let entries = log.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].sql.contains("is_superuser = 1"));
        assert!(entries[1].sql.ends_with("ORDER BY id"));
    }
}
