//! Background execution of facade-triggered scans and backfills.
//!
//! Handlers create a `scan_runs` row, spawn one of these jobs with
//! `tokio::spawn`, and return immediately; the job owns the run's status
//! transitions from there.

use std::sync::Arc;

use campdb_core::AppConfig;
use campdb_db::{complete_scan_run, fail_scan_run, start_scan_run, ScanRunCounts};
use campdb_geocode::{GeocodeError, ReverseGeocoder};
use campdb_scan::{
    backfill_addresses, scan_regions, RegionTask, ScanDeps, ScanOptions, ScanSummary,
};
use campdb_scraper::SearchClient;
use sqlx::PgPool;

fn build_geocoder(config: &AppConfig) -> Result<ReverseGeocoder, GeocodeError> {
    ReverseGeocoder::new(
        config.geocode_base_url.clone(),
        config.geocode_request_timeout_secs,
        &config.geocode_user_agent,
        config.geocode_max_retries,
        config.geocode_retry_backoff_base_ms,
        config.geocode_min_interval_ms,
    )
}

fn build_deps(
    pool: PgPool,
    config: &AppConfig,
    geocode_inline: bool,
) -> anyhow::Result<ScanDeps> {
    let client = SearchClient::new(
        config.search_base_url.clone(),
        config.search_request_timeout_secs,
        &config.search_user_agent,
        config.search_max_retries,
        config.search_retry_backoff_base_ms,
    )?;
    let geocoder = build_geocoder(config)?;
    let mut options = ScanOptions::from_app_config(config);
    options.geocode_inline = geocode_inline;

    Ok(ScanDeps {
        pool,
        client,
        geocoder,
        options,
    })
}

fn counts_from(summary: &ScanSummary) -> ScanRunCounts {
    let clamp = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);
    ScanRunCounts {
        found: clamp(summary.found),
        processed: clamp(summary.processed),
        inserted: clamp(summary.inserted),
        updated: clamp(summary.updated),
        errors: clamp(summary.errors),
    }
}

/// Mark a run failed, logging rather than propagating if even that fails.
async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: String) {
    if let Err(error) = fail_scan_run(pool, run_id, &message).await {
        tracing::error!(run_id, %error, "could not mark scan run as failed");
    }
}

/// Runs a region scan to completion and records the outcome on its run row.
///
/// Per-region failures keep the run alive; the run itself only fails when
/// every region failed or the job cannot be set up at all.
pub async fn run_scan_job(
    pool: PgPool,
    config: Arc<AppConfig>,
    run_id: i64,
    tasks: Vec<RegionTask>,
    worker_count: usize,
    geocode_inline: bool,
) {
    if let Err(error) = start_scan_run(&pool, run_id).await {
        tracing::error!(run_id, %error, "could not start scan run");
        return;
    }

    let deps = match build_deps(pool.clone(), &config, geocode_inline) {
        Ok(deps) => deps,
        Err(error) => {
            fail_run_best_effort(&pool, run_id, format!("{error:#}")).await;
            return;
        }
    };

    let summary = scan_regions(&deps, &tasks, worker_count).await;
    let counts = counts_from(&summary);

    if !summary.failed_regions.is_empty() && summary.failed_regions.len() == tasks.len() {
        let message = format!(
            "all regions failed: {}",
            summary.failed_regions.join(", ")
        );
        fail_run_best_effort(&pool, run_id, message).await;
        return;
    }

    if let Err(error) = complete_scan_run(&pool, run_id, counts).await {
        tracing::error!(run_id, %error, "could not complete scan run");
    }
}

/// Runs an address-backfill pass and records the outcome on its run row.
pub async fn run_backfill_job(
    pool: PgPool,
    config: Arc<AppConfig>,
    run_id: i64,
    limit: i64,
    worker_count: usize,
) {
    if let Err(error) = start_scan_run(&pool, run_id).await {
        tracing::error!(run_id, %error, "could not start backfill run");
        return;
    }

    let geocoder = match build_geocoder(&config) {
        Ok(geocoder) => geocoder,
        Err(error) => {
            fail_run_best_effort(&pool, run_id, format!("{error:#}")).await;
            return;
        }
    };

    match backfill_addresses(&pool, &geocoder, limit, worker_count).await {
        Ok(totals) => {
            let clamp = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);
            let counts = ScanRunCounts {
                found: clamp(totals.scanned),
                processed: clamp(totals.resolved),
                inserted: 0,
                updated: clamp(totals.updated),
                errors: 0,
            };
            if let Err(error) = complete_scan_run(&pool, run_id, counts).await {
                tracing::error!(run_id, %error, "could not complete backfill run");
            }
        }
        Err(error) => {
            fail_run_best_effort(&pool, run_id, format!("{error:#}")).await;
        }
    }
}
