//! Database setup and initialization.
//!
//! Entry points call [`setup_database`] with the configured database path.
//! The schema is created idempotently on every start.

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use std::path::Path;
use std::time::Duration;

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Sets up the `SQLite` database connection and ensures the schema exists.
///
/// This function:
/// 1. Creates the parent directory and the database file if missing
/// 2. Switches the journal to WAL so intake reads do not block the processor
/// 3. Creates all tables and indexes
///
/// # Example
///
/// ```rust,no_run
/// use ohhhllama_db::setup_database;
/// use std::path::Path;
///
/// # async fn example() -> anyhow::Result<()> {
/// let pool = setup_database(Path::new("/var/lib/ohhhllama/queue.db")).await?;
/// # Ok(())
/// # }
/// ```
pub async fn setup_database(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let pool = SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT),
    )
    .await?;

    create_schema(&pool).await?;

    tracing::debug!(target: "ohhhllama.db", path = %db_path.display(), "database ready");

    Ok(pool)
}

/// Creates an in-memory database with the full schema.
///
/// The pool is pinned to a single connection that never expires, because
/// every new in-memory connection would otherwise see an empty database.
#[cfg(any(test, feature = "test-utils"))]
pub async fn setup_test_database() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    create_schema(&pool).await?;
    Ok(pool)
}

/// Creates the complete database schema.
///
/// Safe to call multiple times as all statements use IF NOT EXISTS.
pub(crate) async fn create_schema(pool: &SqlitePool) -> Result<()> {
    // Timestamps are written by the store as "%Y-%m-%d %H:%M:%S%.6f" UTC text,
    // so comparing them as strings orders them chronologically.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL
                CHECK (kind IN ('binary-artifact-pull', 'repository-acquire', 'container-pull')),
            subject TEXT NOT NULL,
            dedup_key TEXT NOT NULL,
            origin TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'in-progress', 'completed', 'failed')),
            error TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK ((status = 'failed') = (error IS NOT NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one active job per dedup key, enforced by the engine.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_active_dedup
        ON jobs(dedup_key)
        WHERE status IN ('pending', 'in-progress')
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_jobs_status_created
        ON jobs(status, created_at, id)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rate_limits (
            origin TEXT NOT NULL,
            day TEXT NOT NULL,
            request_count INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (origin, day)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
