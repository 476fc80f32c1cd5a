//! Per-region scan pipeline and the bounded fan-out across regions.

use campdb_core::{AppConfig, CampgroundRecord};
use campdb_db::persist_records;
use campdb_geocode::{CoordKey, ReverseGeocoder};
use campdb_scraper::{process_listing, SearchClient};
use futures::stream::{self, StreamExt};
use sqlx::PgPool;

use crate::region::{RegionPhase, RegionReport, RegionTask};
use crate::summary::ScanSummary;

/// Tuning knobs for a scan, independent of which regions it covers.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub page_size: u32,
    pub inter_page_delay_ms: u64,
    /// Geocode each fresh record before persistence. Off for bulk sweeps,
    /// where the deferred backfill pipeline is cheaper.
    pub geocode_inline: bool,
    pub geocode_workers: usize,
    pub db_write_max_retries: u32,
    pub db_write_retry_backoff_ms: u64,
}

impl ScanOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            page_size: config.search_page_size,
            inter_page_delay_ms: config.search_inter_page_delay_ms,
            geocode_inline: false,
            geocode_workers: config.geocode_workers,
            db_write_max_retries: config.db_write_max_retries,
            db_write_retry_backoff_ms: config.db_write_retry_backoff_ms,
        }
    }
}

/// Everything a region scan needs. One instance is shared by reference across
/// all workers; the geocoder's cache makes that sharing pay off.
pub struct ScanDeps {
    pub pool: PgPool,
    pub client: SearchClient,
    pub geocoder: ReverseGeocoder,
    pub options: ScanOptions,
}

/// Runs the full pipeline for one region: fetch, validate, optionally
/// geocode, persist. Never returns an error — an upstream failure mid-region
/// keeps the counts accumulated so far and marks the region failed, leaving
/// sibling regions untouched.
pub async fn scan_region(deps: &ScanDeps, task: &RegionTask) -> RegionReport {
    let mut summary = ScanSummary::default();

    tracing::info!(region = %task.name, bbox = %task.bbox, "scanning region");

    let fetch = deps
        .client
        .fetch_region(
            &task.bbox,
            deps.options.page_size,
            task.max_pages,
            deps.options.inter_page_delay_ms,
        )
        .await;
    summary.found = fetch.listings.len() as u64;

    let mut records: Vec<CampgroundRecord> = Vec::with_capacity(fetch.listings.len());
    for listing in &fetch.listings {
        match process_listing(listing) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(region = %task.name, %error, "dropping invalid listing");
                summary.errors += 1;
            }
        }
    }
    summary.processed = records.len() as u64;

    if deps.options.geocode_inline {
        attach_addresses(&deps.geocoder, &mut records, deps.options.geocode_workers).await;
    }

    let totals = persist_records(
        &deps.pool,
        &records,
        deps.options.db_write_max_retries,
        deps.options.db_write_retry_backoff_ms,
    )
    .await;
    summary.inserted = totals.inserted;
    summary.updated = totals.updated;
    summary.errors += totals.errors;

    let phase = if let Some(failure) = &fetch.failure {
        tracing::warn!(
            region = %task.name,
            pages_fetched = fetch.pages_fetched,
            error = %failure,
            "region scan failed partway, partial results kept"
        );
        summary.failed_regions.push(task.name.clone());
        RegionPhase::Failed
    } else {
        tracing::info!(
            region = %task.name,
            found = summary.found,
            processed = summary.processed,
            inserted = summary.inserted,
            updated = summary.updated,
            "region scan complete"
        );
        RegionPhase::Done
    };

    RegionReport {
        region: task.name.clone(),
        phase,
        summary,
    }
}

/// Scans every task through a bounded worker pool and merges the reports.
/// Completion order does not matter; summary merging is commutative.
pub async fn scan_regions(
    deps: &ScanDeps,
    tasks: &[RegionTask],
    worker_count: usize,
) -> ScanSummary {
    let concurrency = worker_count.min(tasks.len()).max(1);

    // Build the futures up front rather than via `StreamExt::map`: keeping a
    // closure in the stream type trips rustc's "implementation of `FnOnce` is
    // not general enough" limitation once the caller `tokio::spawn`s us. The
    // futures stay lazy; `buffer_unordered` still bounds how many run at once.
    let futures: Vec<_> = tasks.iter().map(|task| scan_region(deps, task)).collect();
    let reports: Vec<RegionReport> = stream::iter(futures)
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut total = ScanSummary::default();
    for report in reports {
        total.merge(report.summary);
    }
    total
}

/// Resolves addresses for records that have coordinates but no address yet.
/// Deduplication happens inside `resolve_many`; a failed lookup simply leaves
/// `address = None`.
async fn attach_addresses(
    geocoder: &ReverseGeocoder,
    records: &mut [CampgroundRecord],
    worker_count: usize,
) {
    let coords: Vec<(f64, f64)> = records
        .iter()
        .filter(|r| r.address.is_none())
        .filter_map(|r| Some((r.latitude?, r.longitude?)))
        .collect();
    if coords.is_empty() {
        return;
    }

    let resolved = geocoder.resolve_many(&coords, worker_count).await;

    for record in records.iter_mut().filter(|r| r.address.is_none()) {
        if let (Some(lat), Some(lon)) = (record.latitude, record.longitude) {
            if let Some(address) = resolved.get(&CoordKey::new(lat, lon)) {
                record.address.clone_from(address);
            }
        }
    }
}
