//! Row mapping helpers for `SQLite` queries.

use chrono::{DateTime, NaiveDateTime, Utc};
use ohhhllama_core::{Job, JobId, JobKind, JobStatus, RepositoryError, Subject};
use sqlx::Row;

/// Shared SELECT column list for job queries.
pub const JOB_SELECT_COLUMNS: &str =
    "id, kind, subject, origin, status, error, created_at, updated_at";

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Format a timestamp the way every job column stores it.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Helper to parse datetime strings that may have "UTC" suffix.
pub fn parse_datetime(datetime_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = datetime_str.trim_end_matches(" UTC");
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
        .ok()
}

fn column<'r, T>(row: &'r sqlx::sqlite::SqliteRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Storage(format!("column '{name}': {e}")))
}

fn timestamp(row: &sqlx::sqlite::SqliteRow, name: &str) -> Result<DateTime<Utc>, RepositoryError> {
    let raw: String = column(row, name)?;
    parse_datetime(&raw)
        .ok_or_else(|| RepositoryError::Serialization(format!("bad {name} timestamp '{raw}'")))
}

/// Parse a database row into a [`Job`].
pub fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, RepositoryError> {
    let id: i64 = column(row, "id")?;
    let kind: String = column(row, "kind")?;
    let subject_json: String = column(row, "subject")?;
    let status: String = column(row, "status")?;

    let kind: JobKind = kind.parse().map_err(RepositoryError::Serialization)?;
    let subject: Subject = serde_json::from_str(&subject_json)
        .map_err(|e| RepositoryError::Serialization(format!("job {id} subject: {e}")))?;
    if subject.kind() != kind {
        return Err(RepositoryError::Serialization(format!(
            "job {id} has kind {kind} but a {} subject",
            subject.kind()
        )));
    }

    Ok(Job {
        id: JobId(id),
        subject,
        origin: column(row, "origin")?,
        status: status
            .parse::<JobStatus>()
            .map_err(RepositoryError::Serialization)?,
        error: column(row, "error")?,
        created_at: timestamp(row, "created_at")?,
        updated_at: timestamp(row, "updated_at")?,
    })
}
