//! Database operations for the `scan_runs` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `scan_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRunRow {
    pub id: i64,
    pub public_id: Uuid,
    pub run_type: String,
    pub trigger_source: String,
    pub regions: Vec<String>,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_found: i32,
    pub records_processed: i32,
    pub records_inserted: i32,
    pub records_updated: i32,
    pub record_errors: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counter columns written when a run completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanRunCounts {
    pub found: i32,
    pub processed: i32,
    pub inserted: i32,
    pub updated: i32,
    pub errors: i32,
}

/// Creates a new scan run in `queued` status.
///
/// Generates a UUID in Rust and binds it to `public_id`. Returns the full
/// newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert or fetch fails.
pub async fn create_scan_run(
    pool: &PgPool,
    run_type: &str,
    trigger_source: &str,
    regions: &[String],
) -> Result<ScanRunRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, ScanRunRow>(
        "INSERT INTO scan_runs (public_id, run_type, trigger_source, regions, status) \
         VALUES ($1, $2, $3, $4, 'queued') \
         RETURNING id, public_id, run_type, trigger_source, regions, status, \
                   started_at, completed_at, records_found, records_processed, \
                   records_inserted, records_updated, record_errors, error_message, created_at",
    )
    .bind(public_id)
    .bind(run_type)
    .bind(trigger_source)
    .bind(regions)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a run as `running` and sets `started_at = NOW()`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not `queued`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn start_scan_run(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'queued'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "queued",
        });
    }

    Ok(())
}

/// Marks a run as `succeeded`, sets `completed_at = NOW()` and all counters.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn complete_scan_run(
    pool: &PgPool,
    id: i64,
    counts: ScanRunCounts,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             records_found = $1, records_processed = $2, records_inserted = $3, \
             records_updated = $4, record_errors = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(counts.found)
    .bind(counts.processed)
    .bind(counts.inserted)
    .bind(counts.updated)
    .bind(counts.errors)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a run as `failed`, sets `completed_at = NOW()` and `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanRunTransition`] if the run is not `running`,
/// or [`DbError::Sqlx`] if the update fails.
pub async fn fail_scan_run(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE scan_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Fetches a single run by its `public_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `public_id`,
/// or [`DbError::Sqlx`] if the query fails.
pub async fn get_scan_run_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<ScanRunRow, DbError> {
    let row = sqlx::query_as::<_, ScanRunRow>(
        "SELECT id, public_id, run_type, trigger_source, regions, status, \
                started_at, completed_at, records_found, records_processed, \
                records_inserted, records_updated, record_errors, error_message, created_at \
         FROM scan_runs \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// Returns the most recent `limit` runs, ordered by `created_at DESC`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_runs(pool: &PgPool, limit: i64) -> Result<Vec<ScanRunRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanRunRow>(
        "SELECT id, public_id, run_type, trigger_source, regions, status, \
                started_at, completed_at, records_found, records_processed, \
                records_inserted, records_updated, record_errors, error_message, created_at \
         FROM scan_runs \
         ORDER BY created_at DESC, id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
