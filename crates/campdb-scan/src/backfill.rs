//! Deferred address backfill for campgrounds persisted without one.

use campdb_db::{list_missing_addresses, set_address, DbError};
use campdb_geocode::{CoordKey, ReverseGeocoder};
use sqlx::PgPool;

/// Counters for one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillTotals {
    /// Rows examined (had coordinates, lacked an address).
    pub scanned: u64,
    /// Rows whose coordinates resolved to an address.
    pub resolved: u64,
    /// Rows actually written back.
    pub updated: u64,
}

/// Resolves addresses for up to `limit` campgrounds that have coordinates but
/// no address, writing each result back individually.
///
/// Pacing is per geocode worker, so the aggregate request rate scales with
/// `worker_count`; keep it small against public providers.
///
/// # Errors
///
/// Returns [`DbError`] if the candidate query fails. Individual geocode or
/// write failures are logged and skipped, never aborting the pass.
pub async fn backfill_addresses(
    pool: &PgPool,
    geocoder: &ReverseGeocoder,
    limit: i64,
    worker_count: usize,
) -> Result<BackfillTotals, DbError> {
    let rows = list_missing_addresses(pool, limit).await?;
    let mut totals = BackfillTotals {
        scanned: rows.len() as u64,
        ..BackfillTotals::default()
    };

    if rows.is_empty() {
        return Ok(totals);
    }

    let coords: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|row| Some((row.latitude?, row.longitude?)))
        .collect();

    let resolved = geocoder.resolve_many(&coords, worker_count).await;

    for row in &rows {
        let (Some(lat), Some(lon)) = (row.latitude, row.longitude) else {
            continue;
        };
        let Some(Some(address)) = resolved.get(&CoordKey::new(lat, lon)) else {
            continue;
        };
        totals.resolved += 1;

        match set_address(pool, &row.id, address).await {
            Ok(()) => totals.updated += 1,
            Err(error) => {
                tracing::warn!(campground_id = %row.id, %error, "failed to write address");
            }
        }
    }

    tracing::info!(
        scanned = totals.scanned,
        resolved = totals.resolved,
        updated = totals.updated,
        "address backfill pass complete"
    );

    Ok(totals)
}
