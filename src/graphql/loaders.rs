//! DataLoaders for batching database queries
//!
//! Resolvers that need a user by ID go through [UserLoader] instead of the
//! repository, so a list of N items each pointing at a user costs one
//! `SELECT ... WHERE id IN (...)` instead of N lookups. A fresh loader is
//! created per request, bound to that request's scoped [Database], so batched
//! statements show up in the request's query log.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::{DataLoader, Loader};

use crate::db::{Database, UserRecord};

pub struct UserLoader {
    db: Database,
}

impl UserLoader {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl Loader<i64> for UserLoader {
    type Value = UserRecord;
    type Error = Arc<anyhow::Error>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(count = keys.len(), "Batch loading users");

        let users = self.db.users().get_by_ids(keys).await.map_err(Arc::new)?;
        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }
}

pub fn user_loader(db: Database) -> DataLoader<UserLoader> {
    DataLoader::new(UserLoader::new(db), tokio::spawn)
}
