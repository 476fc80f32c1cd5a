//! Scan and backfill trigger endpoints plus run-status reads.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use campdb_scan::RegionTask;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::jobs;
use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateScanBody {
    pub region: Option<String>,
    pub bbox: Option<String>,
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub geocode_inline: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateParallelScanBody {
    /// Named regions to scan; defaults to every named region.
    pub regions: Option<Vec<String>>,
    pub worker_count: Option<usize>,
    pub max_pages: Option<u32>,
    #[serde(default)]
    pub geocode_inline: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateBackfillBody {
    pub limit: Option<i64>,
    pub worker_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanAccepted {
    scan_run_id: Uuid,
    status: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ScanRunItem {
    scan_run_id: Uuid,
    run_type: String,
    trigger_source: String,
    regions: Vec<String>,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    records_found: i32,
    records_processed: i32,
    records_inserted: i32,
    records_updated: i32,
    record_errors: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<campdb_db::ScanRunRow> for ScanRunItem {
    fn from(row: campdb_db::ScanRunRow) -> Self {
        Self {
            scan_run_id: row.public_id,
            run_type: row.run_type,
            trigger_source: row.trigger_source,
            regions: row.regions,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            records_found: row.records_found,
            records_processed: row.records_processed,
            records_inserted: row.records_inserted,
            records_updated: row.records_updated,
            record_errors: row.record_errors,
            error_message: row.error_message,
            created_at: row.created_at,
        }
    }
}

fn resolve_task(
    req_id: &str,
    body: &CreateScanBody,
) -> Result<RegionTask, ApiError> {
    match (body.region.as_deref(), body.bbox.as_deref()) {
        (Some(name), None) => {
            let region = campdb_core::find_region(name).ok_or_else(|| {
                ApiError::new(
                    req_id,
                    "validation_error",
                    format!("unknown region '{name}'"),
                )
            })?;
            Ok(RegionTask::from_region(region, body.max_pages))
        }
        (None, Some(bbox)) => Ok(RegionTask::from_bbox(bbox, body.max_pages)),
        _ => Err(ApiError::new(
            req_id,
            "validation_error",
            "provide exactly one of 'region' or 'bbox'",
        )),
    }
}

pub(super) async fn create_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateScanBody>,
) -> Result<(StatusCode, Json<ApiResponse<ScanAccepted>>), ApiError> {
    let task = resolve_task(&req_id.0, &body)?;

    let run = campdb_db::create_scan_run(&state.pool, "scan", "api", &[task.name.clone()])
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tokio::spawn(jobs::run_scan_job(
        state.pool.clone(),
        Arc::clone(&state.config),
        run.id,
        vec![task],
        1,
        body.geocode_inline,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScanAccepted {
                scan_run_id: run.public_id,
                status: run.status,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn create_parallel_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateParallelScanBody>,
) -> Result<(StatusCode, Json<ApiResponse<ScanAccepted>>), ApiError> {
    let tasks: Vec<RegionTask> = match &body.regions {
        Some(names) => {
            let mut tasks = Vec::with_capacity(names.len());
            for name in names {
                let region = campdb_core::find_region(name).ok_or_else(|| {
                    ApiError::new(
                        req_id.0.clone(),
                        "validation_error",
                        format!("unknown region '{name}'"),
                    )
                })?;
                tasks.push(RegionTask::from_region(region, body.max_pages));
            }
            tasks
        }
        None => campdb_core::named_regions()
            .iter()
            .map(|region| RegionTask::from_region(region, body.max_pages))
            .collect(),
    };

    if tasks.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "'regions' must not be empty",
        ));
    }

    let region_names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();
    let run = campdb_db::create_scan_run(&state.pool, "scan", "api", &region_names)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let worker_count = body
        .worker_count
        .unwrap_or(state.config.scan_max_concurrent_regions)
        .max(1);

    tokio::spawn(jobs::run_scan_job(
        state.pool.clone(),
        Arc::clone(&state.config),
        run.id,
        tasks,
        worker_count,
        body.geocode_inline,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScanAccepted {
                scan_run_id: run.public_id,
                status: run.status,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn create_backfill(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateBackfillBody>,
) -> Result<(StatusCode, Json<ApiResponse<ScanAccepted>>), ApiError> {
    let run = campdb_db::create_scan_run(&state.pool, "backfill", "api", &[])
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let limit = body.limit.unwrap_or(100).clamp(1, 1_000);
    let worker_count = body
        .worker_count
        .unwrap_or(state.config.geocode_workers)
        .max(1);

    tokio::spawn(jobs::run_backfill_job(
        state.pool.clone(),
        Arc::clone(&state.config),
        run.id,
        limit,
        worker_count,
    ));

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScanAccepted {
                scan_run_id: run.public_id,
                status: run.status,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ScanRunItem>>, ApiError> {
    let row = campdb_db::get_scan_run_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ScanRunItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct ScanRunsQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ScanRunsQuery>,
) -> Result<Json<ApiResponse<Vec<ScanRunItem>>>, ApiError> {
    let rows = campdb_db::list_scan_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ScanRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
