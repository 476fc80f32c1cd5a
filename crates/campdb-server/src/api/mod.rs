mod campgrounds;
mod scans;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use campdb_core::AppConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &campdb_db::DbError) -> ApiError {
    if matches!(error, campdb_db::DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/scans",
            get(scans::list_scans).post(scans::create_scan),
        )
        .route("/api/v1/scans/parallel", post(scans::create_parallel_scan))
        .route("/api/v1/scans/{public_id}", get(scans::get_scan))
        .route("/api/v1/backfill", post(scans::create_backfill))
        .route("/api/v1/campgrounds", get(campgrounds::list_campgrounds))
        .route("/api/v1/campgrounds/{id}", get(campgrounds::get_campground))
        .route("/api/v1/regions", get(campgrounds::list_regions))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match campdb_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use campdb_core::CampgroundRecord;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use tower::ServiceExt;

    fn test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            database_url: "postgres://unused".to_string(),
            env: campdb_core::Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            log_level: "info".to_string(),
            db_max_connections: 5,
            db_min_connections: 1,
            db_acquire_timeout_secs: 5,
            search_base_url: "http://127.0.0.1:1/search".to_string(),
            search_request_timeout_secs: 5,
            search_user_agent: "campdb-test/0.1".to_string(),
            search_page_size: 20,
            search_max_retries: 0,
            search_retry_backoff_base_ms: 0,
            search_inter_page_delay_ms: 0,
            scan_max_concurrent_regions: 2,
            geocode_base_url: "http://127.0.0.1:1/geo".to_string(),
            geocode_request_timeout_secs: 5,
            geocode_user_agent: "campdb-test/0.1".to_string(),
            geocode_max_retries: 0,
            geocode_retry_backoff_base_ms: 0,
            geocode_min_interval_ms: 0,
            geocode_workers: 1,
            db_write_max_retries: 0,
            db_write_retry_backoff_ms: 0,
        })
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        build_app(AppState {
            pool,
            config: test_config(),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_not_found_maps_to_404() {
        let response = ApiError::new("req-1", "not_found", "no such row").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn health_returns_ok_with_request_id(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "test-req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("x-request-id").map(|v| v.to_str().unwrap()),
            Some("test-req-42")
        );
        let json = body_json(response).await;
        assert_eq!(json["data"]["status"].as_str(), Some("ok"));
        assert_eq!(json["meta"]["request_id"].as_str(), Some("test-req-42"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_campground_returns_404_for_unknown_id(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/campgrounds/no-such-id")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_campgrounds_returns_seeded_rows(pool: sqlx::PgPool) {
        let mut record = CampgroundRecord::with_id("api-camp-1".to_string());
        record.name = Some("Api Test Camp".to_string());
        record.region_name = Some("California".to_string());
        campdb_db::upsert_campground(&pool, &record)
            .await
            .expect("seed campground");

        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/campgrounds?region=california")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"].as_str(), Some("api-camp-1"));
        assert_eq!(data[0]["name"].as_str(), Some("Api Test Camp"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn list_regions_includes_named_regions(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/regions")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let data = json["data"].as_array().expect("data array");
        assert!(data.iter().any(|r| r["name"].as_str() == Some("california")));
        assert!(data
            .iter()
            .all(|r| r["bbox"].as_str().is_some_and(|b| b.split(',').count() == 4)));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_scan_rejects_unknown_region(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"region":"atlantis"}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"].as_str(), Some("validation_error"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_scan_rejects_region_and_bbox_together(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"region":"california","bbox":"-1.0,2.0,3.0,4.0"}"#,
                    ))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn create_scan_queues_a_run(pool: sqlx::PgPool) {
        let app = test_app(pool.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/scans")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"region":"california","max_pages":1}"#))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let json = body_json(response).await;
        let public_id = json["data"]["scan_run_id"].as_str().expect("run id");

        // The run row exists and is queryable through the status endpoint,
        // whatever state the background job has reached by now.
        let row = campdb_db::get_scan_run_by_public_id(
            &pool,
            public_id.parse().expect("uuid"),
        )
        .await
        .expect("run row");
        assert_eq!(row.run_type, "scan");
        assert_eq!(row.trigger_source, "api");
        assert_eq!(row.regions, vec!["california".to_string()]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn get_scan_returns_404_for_unknown_run(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/scans/4fd41707-2a7b-4ab3-b9a1-9e18a8a7dd77")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
