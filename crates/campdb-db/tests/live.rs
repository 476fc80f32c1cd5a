//! Live integration tests for campdb-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/campdb-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use campdb_core::CampgroundRecord;
use campdb_db::{
    complete_scan_run, create_scan_run, fail_scan_run, get_campground,
    get_scan_run_by_public_id, list_campgrounds, list_missing_addresses, list_scan_runs,
    persist_records, set_address, start_scan_run, upsert_campground, DbError, ScanRunCounts,
    UpsertOutcome,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_record(id: &str) -> CampgroundRecord {
    let mut record = CampgroundRecord::with_id(id.to_string());
    record.name = Some(format!("Camp {id}"));
    record.latitude = Some(39.5);
    record.longitude = Some(-120.1);
    record.region_name = Some("California".to_string());
    record.bookable = true;
    record.rating = Some(4.2);
    record.reviews_count = 10;
    record
}

// ---------------------------------------------------------------------------
// Section 1: Campground upserts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_inserts_then_updates(pool: sqlx::PgPool) {
    let record = make_record("camp-1");

    let first = upsert_campground(&pool, &record)
        .await
        .expect("first upsert failed");
    assert_eq!(first, UpsertOutcome::Inserted);

    let mut refreshed = record.clone();
    refreshed.name = Some("Camp One Renamed".to_string());
    refreshed.reviews_count = 12;

    let second = upsert_campground(&pool, &refreshed)
        .await
        .expect("second upsert failed");
    assert_eq!(second, UpsertOutcome::Updated);

    let row = get_campground(&pool, "camp-1")
        .await
        .expect("get_campground failed");
    assert_eq!(row.name.as_deref(), Some("Camp One Renamed"));
    assert_eq!(row.reviews_count, 12);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM campgrounds")
        .fetch_one(&pool)
        .await
        .expect("count failed");
    assert_eq!(count, 1, "re-upsert must not create a second row");
}

#[sqlx::test(migrations = "../../migrations")]
async fn persist_records_counts_inserts_and_updates(pool: sqlx::PgPool) {
    let batch: Vec<CampgroundRecord> =
        (1..=5).map(|n| make_record(&format!("camp-{n}"))).collect();

    let first = persist_records(&pool, &batch, 0, 0).await;
    assert_eq!(first.inserted, 5);
    assert_eq!(first.updated, 0);
    assert_eq!(first.errors, 0);

    let second = persist_records(&pool, &batch, 0, 0).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.updated, 5);
    assert_eq!(second.errors, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn backfilled_address_survives_rescan_without_one(pool: sqlx::PgPool) {
    let record = make_record("camp-addr");
    upsert_campground(&pool, &record).await.expect("insert failed");

    set_address(&pool, "camp-addr", "1 Forest Rd, Truckee, CA")
        .await
        .expect("set_address failed");

    // Re-scan delivers the same record with no address attached.
    upsert_campground(&pool, &record).await.expect("re-upsert failed");

    let row = get_campground(&pool, "camp-addr")
        .await
        .expect("get_campground failed");
    assert_eq!(row.address.as_deref(), Some("1 Forest Rd, Truckee, CA"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn incoming_address_replaces_stored_one(pool: sqlx::PgPool) {
    let mut record = make_record("camp-addr2");
    record.address = Some("Old Address".to_string());
    upsert_campground(&pool, &record).await.expect("insert failed");

    record.address = Some("New Address".to_string());
    upsert_campground(&pool, &record).await.expect("re-upsert failed");

    let row = get_campground(&pool, "camp-addr2")
        .await
        .expect("get_campground failed");
    assert_eq!(row.address.as_deref(), Some("New Address"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_address_on_unknown_id_is_not_found(pool: sqlx::PgPool) {
    let result = set_address(&pool, "no-such-camp", "Nowhere").await;
    assert!(matches!(result, Err(DbError::NotFound)));
}

// ---------------------------------------------------------------------------
// Section 2: Reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_campgrounds_filters_by_region(pool: sqlx::PgPool) {
    let mut california = make_record("camp-ca");
    california.region_name = Some("California".to_string());
    let mut texas = make_record("camp-tx");
    texas.region_name = Some("Texas".to_string());

    upsert_campground(&pool, &california).await.expect("insert failed");
    upsert_campground(&pool, &texas).await.expect("insert failed");

    let all = list_campgrounds(&pool, 50, None)
        .await
        .expect("list failed");
    assert_eq!(all.len(), 2);

    let filtered = list_campgrounds(&pool, 50, Some("texas"))
        .await
        .expect("filtered list failed");
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].id, "camp-tx");
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_addresses_excludes_rows_without_coordinates(pool: sqlx::PgPool) {
    let with_coords = make_record("camp-geo");
    upsert_campground(&pool, &with_coords).await.expect("insert failed");

    let no_coords = CampgroundRecord::with_id("camp-nogeo".to_string());
    upsert_campground(&pool, &no_coords).await.expect("insert failed");

    let mut addressed = make_record("camp-done");
    addressed.address = Some("Already resolved".to_string());
    upsert_campground(&pool, &addressed).await.expect("insert failed");

    let candidates = list_missing_addresses(&pool, 50)
        .await
        .expect("list_missing_addresses failed");
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, "camp-geo");
}

// ---------------------------------------------------------------------------
// Section 3: Scan run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scan_run_lifecycle_queued_to_succeeded(pool: sqlx::PgPool) {
    let regions = vec!["california".to_string(), "texas".to_string()];
    let run = create_scan_run(&pool, "scan", "cli", &regions)
        .await
        .expect("create_scan_run failed");

    assert_eq!(run.status, "queued");
    assert_eq!(run.regions, regions);
    assert!(run.started_at.is_none());
    assert!(run.completed_at.is_none());

    start_scan_run(&pool, run.id).await.expect("start failed");

    let counts = ScanRunCounts {
        found: 45,
        processed: 43,
        inserted: 43,
        updated: 0,
        errors: 0,
    };
    complete_scan_run(&pool, run.id, counts)
        .await
        .expect("complete failed");

    let fetched = get_scan_run_by_public_id(&pool, run.public_id)
        .await
        .expect("fetch failed");
    assert_eq!(fetched.status, "succeeded");
    assert!(fetched.started_at.is_some());
    assert!(fetched.completed_at.is_some());
    assert_eq!(fetched.records_found, 45);
    assert_eq!(fetched.records_processed, 43);
    assert_eq!(fetched.records_inserted, 43);
    assert_eq!(fetched.records_updated, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_run_failure_records_message(pool: sqlx::PgPool) {
    let run = create_scan_run(&pool, "scan", "api", &["us".to_string()])
        .await
        .expect("create failed");
    start_scan_run(&pool, run.id).await.expect("start failed");
    fail_scan_run(&pool, run.id, "upstream returned 503 on every page")
        .await
        .expect("fail failed");

    let fetched = get_scan_run_by_public_id(&pool, run.public_id)
        .await
        .expect("fetch failed");
    assert_eq!(fetched.status, "failed");
    assert_eq!(
        fetched.error_message.as_deref(),
        Some("upstream returned 503 on every page")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn completing_a_queued_run_is_an_invalid_transition(pool: sqlx::PgPool) {
    let run = create_scan_run(&pool, "backfill", "cli", &[])
        .await
        .expect("create failed");

    let result = complete_scan_run(&pool, run.id, ScanRunCounts::default()).await;
    assert!(matches!(
        result,
        Err(DbError::InvalidScanRunTransition { expected_status: "running", .. })
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_scan_runs_returns_most_recent_first(pool: sqlx::PgPool) {
    for n in 0..3 {
        create_scan_run(&pool, "scan", "cli", &[format!("region-{n}")])
            .await
            .expect("create failed");
    }

    let runs = list_scan_runs(&pool, 2).await.expect("list failed");
    assert_eq!(runs.len(), 2);
    assert!(runs[0].id > runs[1].id);
}
