//! Database operations for the `campgrounds` table.

use std::time::Duration;

use campdb_core::CampgroundRecord;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `campgrounds` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampgroundRow {
    pub id: String,
    pub record_type: Option<String>,
    pub links_self: Option<String>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region_name: Option<String>,
    pub administrative_area: Option<String>,
    pub nearest_city_name: Option<String>,
    pub accommodation_type_names: Vec<String>,
    pub bookable: bool,
    pub camper_types: Vec<String>,
    pub operator: Option<String>,
    pub photo_url: Option<String>,
    pub photo_urls: Vec<String>,
    pub photos_count: i32,
    pub rating: Option<f64>,
    pub reviews_count: i32,
    pub slug: Option<String>,
    pub price_low: Option<f64>,
    pub price_high: Option<f64>,
    pub availability_updated_at: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Aggregate result of persisting a batch of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistTotals {
    pub inserted: u64,
    pub updated: u64,
    pub errors: u64,
}

// ---------------------------------------------------------------------------
// Write operations
// ---------------------------------------------------------------------------

/// Insert a campground or update the existing row with the same `id`.
///
/// Every scraped column is overwritten with the incoming value except
/// `address`, which is only replaced when the incoming record carries one —
/// addresses are backfilled separately and must survive re-scans that do not
/// include them.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the upsert fails.
pub async fn upsert_campground(
    pool: &PgPool,
    record: &CampgroundRecord,
) -> Result<UpsertOutcome, sqlx::Error> {
    let is_new: bool = sqlx::query_scalar::<_, bool>(
        "INSERT INTO campgrounds \
             (id, record_type, links_self, name, latitude, longitude, region_name, \
              administrative_area, nearest_city_name, accommodation_type_names, bookable, \
              camper_types, operator, photo_url, photo_urls, photos_count, rating, \
              reviews_count, slug, price_low, price_high, availability_updated_at, address) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
                 $17, $18, $19, $20, $21, $22, $23) \
         ON CONFLICT (id) DO UPDATE SET \
             record_type              = EXCLUDED.record_type, \
             links_self               = EXCLUDED.links_self, \
             name                     = EXCLUDED.name, \
             latitude                 = EXCLUDED.latitude, \
             longitude                = EXCLUDED.longitude, \
             region_name              = EXCLUDED.region_name, \
             administrative_area      = EXCLUDED.administrative_area, \
             nearest_city_name        = EXCLUDED.nearest_city_name, \
             accommodation_type_names = EXCLUDED.accommodation_type_names, \
             bookable                 = EXCLUDED.bookable, \
             camper_types             = EXCLUDED.camper_types, \
             operator                 = EXCLUDED.operator, \
             photo_url                = EXCLUDED.photo_url, \
             photo_urls               = EXCLUDED.photo_urls, \
             photos_count             = EXCLUDED.photos_count, \
             rating                   = EXCLUDED.rating, \
             reviews_count            = EXCLUDED.reviews_count, \
             slug                     = EXCLUDED.slug, \
             price_low                = EXCLUDED.price_low, \
             price_high               = EXCLUDED.price_high, \
             availability_updated_at  = EXCLUDED.availability_updated_at, \
             address                  = COALESCE(EXCLUDED.address, campgrounds.address), \
             updated_at               = NOW() \
         RETURNING (xmax = 0) AS is_new",
    )
    .bind(&record.id)
    .bind(&record.record_type)
    .bind(&record.links_self)
    .bind(&record.name)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(&record.region_name)
    .bind(&record.administrative_area)
    .bind(&record.nearest_city_name)
    .bind(&record.accommodation_type_names)
    .bind(record.bookable)
    .bind(&record.camper_types)
    .bind(&record.operator)
    .bind(&record.photo_url)
    .bind(&record.photo_urls)
    .bind(record.photos_count)
    .bind(record.rating)
    .bind(record.reviews_count)
    .bind(&record.slug)
    .bind(record.price_low)
    .bind(record.price_high)
    .bind(record.availability_updated_at)
    .bind(&record.address)
    .fetch_one(pool)
    .await?;

    Ok(if is_new {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    })
}

/// Persist a batch of records one at a time, retrying transient failures.
///
/// One bad record never aborts the batch: a record whose upsert exhausts its
/// retries is counted under `errors` and the loop moves on.
pub async fn persist_records(
    pool: &PgPool,
    records: &[CampgroundRecord],
    max_retries: u32,
    backoff_ms: u64,
) -> PersistTotals {
    let mut totals = PersistTotals::default();

    for record in records {
        match upsert_with_retry(pool, record, max_retries, backoff_ms).await {
            Ok(UpsertOutcome::Inserted) => totals.inserted += 1,
            Ok(UpsertOutcome::Updated) => totals.updated += 1,
            Err(error) => {
                tracing::error!(campground_id = %record.id, %error, "failed to persist record");
                totals.errors += 1;
            }
        }
    }

    totals
}

async fn upsert_with_retry(
    pool: &PgPool,
    record: &CampgroundRecord,
    max_retries: u32,
    backoff_ms: u64,
) -> Result<UpsertOutcome, sqlx::Error> {
    let mut attempt: u32 = 0;
    loop {
        match upsert_campground(pool, record).await {
            Ok(outcome) => return Ok(outcome),
            Err(error) if attempt < max_retries && is_transient(&error) => {
                attempt += 1;
                tracing::warn!(
                    campground_id = %record.id,
                    attempt,
                    max_retries,
                    %error,
                    "transient database error, retrying upsert"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms * u64::from(attempt))).await;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Connection-level failures are worth a retry; constraint and decode errors
/// will fail the same way every time.
fn is_transient(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
    )
}

/// Store a resolved address on an existing campground.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no campground has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_address(pool: &PgPool, id: &str, address: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE campgrounds SET address = $1, updated_at = NOW() WHERE id = $2",
    )
    .bind(address)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Read operations
// ---------------------------------------------------------------------------

const CAMPGROUND_COLUMNS: &str = "id, record_type, links_self, name, latitude, longitude, \
     region_name, administrative_area, nearest_city_name, accommodation_type_names, bookable, \
     camper_types, operator, photo_url, photo_urls, photos_count, rating, reviews_count, slug, \
     price_low, price_high, availability_updated_at, address, created_at, updated_at";

/// Fetch a single campground by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_campground(pool: &PgPool, id: &str) -> Result<CampgroundRow, DbError> {
    let row = sqlx::query_as::<_, CampgroundRow>(&format!(
        "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}

/// List campgrounds ordered by name, optionally filtered by region name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_campgrounds(
    pool: &PgPool,
    limit: i64,
    region: Option<&str>,
) -> Result<Vec<CampgroundRow>, DbError> {
    let rows = if let Some(region) = region {
        sqlx::query_as::<_, CampgroundRow>(&format!(
            "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds \
             WHERE region_name ILIKE $1 \
             ORDER BY name NULLS LAST, id \
             LIMIT $2"
        ))
        .bind(region)
        .bind(limit)
        .fetch_all(pool)
        .await?
    } else {
        sqlx::query_as::<_, CampgroundRow>(&format!(
            "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds \
             ORDER BY name NULLS LAST, id \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(pool)
        .await?
    };

    Ok(rows)
}

/// List campgrounds that have coordinates but no address yet, oldest first.
///
/// These are the candidates for reverse-geocode backfill.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_missing_addresses(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CampgroundRow>, DbError> {
    let rows = sqlx::query_as::<_, CampgroundRow>(&format!(
        "SELECT {CAMPGROUND_COLUMNS} FROM campgrounds \
         WHERE address IS NULL AND latitude IS NOT NULL AND longitude IS NOT NULL \
         ORDER BY updated_at ASC, id \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
