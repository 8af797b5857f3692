//! Composition utilities for wiring the stores with `SQLite` backends.
//!
//! Construction only; no domain logic.

use sqlx::SqlitePool;
use std::sync::Arc;

use ohhhllama_core::{Clock, Stores};

use crate::repositories::{SqliteJobStore, SqliteRateLimiter};

/// Factory for creating store instances with `SQLite` backends.
pub struct StoreFactory;

impl StoreFactory {
    /// Build the job store and rate limiter from one pool.
    ///
    /// This is the recommended way for adapters to obtain stores.
    pub fn build_stores(pool: SqlitePool, rate_limit: u32) -> Stores {
        Stores::new(
            Arc::new(SqliteJobStore::new(pool.clone())),
            Arc::new(SqliteRateLimiter::new(pool, rate_limit)),
        )
    }

    /// Same as [`Self::build_stores`] with an explicit clock for the limiter.
    pub fn build_stores_with_clock(
        pool: SqlitePool,
        rate_limit: u32,
        clock: Arc<dyn Clock>,
    ) -> Stores {
        Stores::new(
            Arc::new(SqliteJobStore::new(pool.clone())),
            Arc::new(SqliteRateLimiter::with_clock(pool, rate_limit, clock)),
        )
    }
}

/// Test database helper for integration tests.
///
/// Provides an in-memory `SQLite` database with the production schema.
#[cfg(any(test, feature = "test-utils"))]
pub struct TestDb {
    pool: SqlitePool,
}

#[cfg(any(test, feature = "test-utils"))]
impl TestDb {
    /// Create a new in-memory test database with full schema.
    pub async fn new() -> anyhow::Result<Self> {
        let pool = crate::setup::setup_test_database().await?;
        Ok(Self { pool })
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn job_store(&self) -> SqliteJobStore {
        SqliteJobStore::new(self.pool.clone())
    }

    pub fn rate_limiter(&self, limit: u32) -> SqliteRateLimiter {
        SqliteRateLimiter::new(self.pool.clone(), limit)
    }

    pub fn stores(&self, rate_limit: u32) -> Stores {
        StoreFactory::build_stores(self.pool.clone(), rate_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ohhhllama_core::Subject;

    #[tokio::test]
    async fn test_stores_share_one_database() {
        let db = TestDb::new().await.unwrap();
        let stores = db.stores(2);

        stores.jobs.enqueue(&Subject::binary("a"), "o").await.unwrap();
        assert_eq!(stores.rate_limiter.limit(), 2);
        assert!(stores.rate_limiter.check_and_increment("o").await.unwrap().allowed);

        let (jobs,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM jobs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(jobs, 1);
    }
}
