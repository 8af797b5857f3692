//! `SQLite` implementations of the storage ports.

pub mod row_mappers;
mod sqlite_job_store;
mod sqlite_rate_limiter;

pub use sqlite_job_store::SqliteJobStore;
pub use sqlite_rate_limiter::SqliteRateLimiter;
