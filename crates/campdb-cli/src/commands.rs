//! Command handlers for the CLI.
//!
//! These are called from `main` after the database pool and config are
//! established. Per-region failures are logged and reported in the summary
//! rather than propagated, so one bad region does not abort a sweep; the
//! process only exits non-zero on infrastructure failures.

use campdb_core::AppConfig;
use campdb_db::ScanRunCounts;
use campdb_geocode::ReverseGeocoder;
use campdb_scan::{
    backfill_addresses, scan_regions, RegionTask, ScanDeps, ScanOptions, ScanSummary,
};
use campdb_scraper::SearchClient;
use sqlx::PgPool;

pub(crate) struct ScanArgs {
    pub region: Option<String>,
    pub bbox: Option<String>,
    pub all: bool,
    pub max_pages: Option<u32>,
    pub workers: Option<usize>,
    pub no_geocode: bool,
}

fn resolve_tasks(args: &ScanArgs) -> anyhow::Result<Vec<RegionTask>> {
    if args.all {
        return Ok(campdb_core::regions::us_sweep()
            .into_iter()
            .map(|region| RegionTask::from_region(region, args.max_pages))
            .collect());
    }
    if let Some(name) = args.region.as_deref() {
        let region = campdb_core::find_region(name)
            .ok_or_else(|| anyhow::anyhow!("unknown region '{name}'; run `campdb regions`"))?;
        return Ok(vec![RegionTask::from_region(region, args.max_pages)]);
    }
    if let Some(bbox) = args.bbox.as_deref() {
        return Ok(vec![RegionTask::from_bbox(bbox, args.max_pages)]);
    }
    anyhow::bail!("provide one of --region, --bbox, or --all")
}

fn build_deps(pool: PgPool, config: &AppConfig, geocode_inline: bool) -> anyhow::Result<ScanDeps> {
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

fn build_geocoder(config: &AppConfig) -> anyhow::Result<ReverseGeocoder> {
    Ok(ReverseGeocoder::new(
        config.geocode_base_url.clone(),
        config.geocode_request_timeout_secs,
        &config.geocode_user_agent,
        config.geocode_max_retries,
        config.geocode_retry_backoff_base_ms,
        config.geocode_min_interval_ms,
    )?)
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
    if let Err(error) = campdb_db::fail_scan_run(pool, run_id, &message).await {
        tracing::error!(run_id, %error, "could not mark scan run as failed");
    }
}

/// Scan the requested regions and persist every valid record.
///
/// # Errors
///
/// Returns an error if the region arguments are invalid, the HTTP clients
/// cannot be built, or the run row cannot be created. Per-region fetch
/// failures are reported in the printed summary instead.
pub(crate) async fn run_scan(
    pool: &PgPool,
    config: &AppConfig,
    args: &ScanArgs,
) -> anyhow::Result<()> {
    let tasks = resolve_tasks(args)?;
    let region_names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
    let worker_count = args
        .workers
        .unwrap_or(config.scan_max_concurrent_regions)
        .max(1);

    let deps = build_deps(pool.clone(), config, !args.no_geocode)?;

    let run = campdb_db::create_scan_run(pool, "scan", "cli", &region_names).await?;
    if let Err(e) = campdb_db::start_scan_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    let summary = scan_regions(&deps, &tasks, worker_count).await;

    if !summary.failed_regions.is_empty() && summary.failed_regions.len() == tasks.len() {
        let message = format!("all regions failed: {}", summary.failed_regions.join(", "));
        fail_run_best_effort(pool, run.id, message.clone()).await;
        println!("scan failed: {message}");
        return Ok(());
    }

    campdb_db::complete_scan_run(pool, run.id, counts_from(&summary)).await?;

    println!(
        "scan complete: found {}, processed {}, inserted {}, updated {}, errors {}",
        summary.found, summary.processed, summary.inserted, summary.updated, summary.errors
    );
    if !summary.failed_regions.is_empty() {
        println!(
            "regions with partial results: {}",
            summary.failed_regions.join(", ")
        );
    }

    Ok(())
}

/// Resolve addresses for up to `limit` stored campgrounds missing one.
///
/// # Errors
///
/// Returns an error if the geocoder cannot be built, the run row cannot be
/// created, or the candidate query fails.
pub(crate) async fn run_backfill(
    pool: &PgPool,
    config: &AppConfig,
    limit: i64,
    workers: Option<usize>,
) -> anyhow::Result<()> {
    let geocoder = build_geocoder(config)?;
    let worker_count = workers.unwrap_or(config.geocode_workers).max(1);

    let run = campdb_db::create_scan_run(pool, "backfill", "cli", &[]).await?;
    if let Err(e) = campdb_db::start_scan_run(pool, run.id).await {
        fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
        return Err(e.into());
    }

    match backfill_addresses(pool, &geocoder, limit, worker_count).await {
        Ok(totals) => {
            let clamp = |v: u64| i32::try_from(v).unwrap_or(i32::MAX);
            let counts = ScanRunCounts {
                found: clamp(totals.scanned),
                processed: clamp(totals.resolved),
                inserted: 0,
                updated: clamp(totals.updated),
                errors: 0,
            };
            campdb_db::complete_scan_run(pool, run.id, counts).await?;
            println!(
                "backfill complete: scanned {}, resolved {}, updated {}",
                totals.scanned, totals.resolved, totals.updated
            );
            Ok(())
        }
        Err(e) => {
            fail_run_best_effort(pool, run.id, format!("{e:#}")).await;
            Err(e.into())
        }
    }
}

pub(crate) fn print_regions() {
    for region in campdb_core::named_regions() {
        println!("{:<22} {}", region.name, region.bbox);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_tasks_requires_a_target() {
        let args = ScanArgs {
            region: None,
            bbox: None,
            all: false,
            max_pages: None,
            workers: None,
            no_geocode: false,
        };
        assert!(resolve_tasks(&args).is_err());
    }

    #[test]
    fn resolve_tasks_rejects_unknown_region() {
        let args = ScanArgs {
            region: Some("atlantis".to_string()),
            bbox: None,
            all: false,
            max_pages: None,
            workers: None,
            no_geocode: false,
        };
        assert!(resolve_tasks(&args).is_err());
    }

    #[test]
    fn resolve_tasks_builds_sweep_for_all() {
        let args = ScanArgs {
            region: None,
            bbox: None,
            all: true,
            max_pages: Some(2),
            workers: None,
            no_geocode: false,
        };
        let tasks = resolve_tasks(&args).expect("sweep tasks");
        assert!(tasks.len() > 1);
        assert!(tasks.iter().all(|t| t.max_pages == Some(2)));
    }
}
