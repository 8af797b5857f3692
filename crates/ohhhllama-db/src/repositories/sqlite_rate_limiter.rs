//! `SQLite` implementation of the [`RateLimiter`] port.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;

use ohhhllama_core::{Clock, RateDecision, RateLimiter, RepositoryError, SystemClock};

/// Per-origin daily counter stored in `rate_limits`.
///
/// The check and the increment are a single UPSERT, so concurrent requests
/// from one origin can never push the count past the limit.
pub struct SqliteRateLimiter {
    pool: SqlitePool,
    limit: u32,
    clock: Arc<dyn Clock>,
}

impl SqliteRateLimiter {
    pub fn new(pool: SqlitePool, limit: u32) -> Self {
        Self::with_clock(pool, limit, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: SqlitePool, limit: u32, clock: Arc<dyn Clock>) -> Self {
        Self { pool, limit, clock }
    }

    fn today(&self) -> String {
        self.clock.today().format("%Y-%m-%d").to_string()
    }
}

#[async_trait]
impl RateLimiter for SqliteRateLimiter {
    async fn check_and_increment(&self, origin: &str) -> Result<RateDecision, RepositoryError> {
        let day = self.today();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        // Returns no row when the existing count is already at the limit.
        let count: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO rate_limits (origin, day, request_count)
            VALUES (?, ?, 1)
            ON CONFLICT(origin, day)
            DO UPDATE SET request_count = request_count + 1
            WHERE request_count < ?
            RETURNING request_count
            "#,
        )
        .bind(origin)
        .bind(&day)
        .bind(i64::from(self.limit))
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;

        let decision = match count {
            Some(count) => RateDecision {
                allowed: true,
                remaining: self
                    .limit
                    .saturating_sub(u32::try_from(count).unwrap_or(u32::MAX)),
                limit: self.limit,
            },
            None => RateDecision {
                allowed: false,
                remaining: 0,
                limit: self.limit,
            },
        };

        if !decision.allowed {
            tracing::warn!(target: "ohhhllama.intake", origin, day = %day, "rate limit exceeded");
        }
        Ok(decision)
    }

    async fn reset(&self, origin: &str) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE origin = ? AND day = ?")
            .bind(origin)
            .bind(self.today())
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        tracing::info!(target: "ohhhllama.intake", origin, "rate limit reset");
        Ok(result.rows_affected())
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;
    use chrono::{DateTime, NaiveDate, Utc};
    use std::sync::Mutex;

    struct FixedClock(Mutex<NaiveDate>);

    impl FixedClock {
        fn new(y: i32, m: u32, d: u32) -> Arc<Self> {
            Arc::new(Self(Mutex::new(NaiveDate::from_ymd_opt(y, m, d).unwrap())))
        }

        fn advance_day(&self) {
            let mut day = self.0.lock().unwrap();
            *day = day.succ_opt().unwrap();
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }

        fn today(&self) -> NaiveDate {
            *self.0.lock().unwrap()
        }
    }

    async fn limiter(limit: u32) -> (SqliteRateLimiter, Arc<FixedClock>) {
        let clock = FixedClock::new(2024, 5, 1);
        let pool = setup_test_database().await.unwrap();
        (
            SqliteRateLimiter::with_clock(pool, limit, clock.clone()),
            clock,
        )
    }

    #[tokio::test]
    async fn test_allows_limit_then_denies() {
        let (limiter, _) = limiter(3).await;

        let first = limiter.check_and_increment("10.0.0.1").await.unwrap();
        assert_eq!(
            first,
            RateDecision {
                allowed: true,
                remaining: 2,
                limit: 3
            }
        );
        assert_eq!(
            limiter.check_and_increment("10.0.0.1").await.unwrap().remaining,
            1
        );
        assert_eq!(
            limiter.check_and_increment("10.0.0.1").await.unwrap().remaining,
            0
        );

        let denied = limiter.check_and_increment("10.0.0.1").await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    #[tokio::test]
    async fn test_next_day_resets() {
        let (limiter, clock) = limiter(1).await;
        assert!(limiter.check_and_increment("a").await.unwrap().allowed);
        assert!(!limiter.check_and_increment("a").await.unwrap().allowed);

        clock.advance_day();
        assert!(limiter.check_and_increment("a").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_origins_are_independent() {
        let (limiter, _) = limiter(1).await;
        assert!(limiter.check_and_increment("a").await.unwrap().allowed);
        assert!(limiter.check_and_increment("b").await.unwrap().allowed);
        assert!(!limiter.check_and_increment("a").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_denied_calls_do_not_grow_count() {
        let (limiter, _) = limiter(2).await;
        for _ in 0..5 {
            limiter.check_and_increment("a").await.unwrap();
        }
        let (count,): (i64,) =
            sqlx::query_as("SELECT request_count FROM rate_limits WHERE origin = 'a'")
                .fetch_one(&limiter.pool)
                .await
                .unwrap();
        assert_eq!(count, 2);

        let (rows,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM rate_limits")
            .fetch_one(&limiter.pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[tokio::test]
    async fn test_reset() {
        let (limiter, _) = limiter(1).await;
        limiter.check_and_increment("a").await.unwrap();
        assert_eq!(limiter.reset("a").await.unwrap(), 1);
        assert!(limiter.check_and_increment("a").await.unwrap().allowed);
        assert_eq!(limiter.reset("nobody").await.unwrap(), 0);
    }
}
