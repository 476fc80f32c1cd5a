use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use campdb_db::CampgroundRow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CampgroundsQuery {
    pub limit: Option<i64>,
    pub region: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CampgroundItem {
    id: String,
    name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    region_name: Option<String>,
    administrative_area: Option<String>,
    nearest_city_name: Option<String>,
    accommodation_type_names: Vec<String>,
    bookable: bool,
    camper_types: Vec<String>,
    operator: Option<String>,
    photo_url: Option<String>,
    photos_count: i32,
    rating: Option<f64>,
    reviews_count: i32,
    slug: Option<String>,
    price_low: Option<f64>,
    price_high: Option<f64>,
    address: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<CampgroundRow> for CampgroundItem {
    fn from(row: CampgroundRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            region_name: row.region_name,
            administrative_area: row.administrative_area,
            nearest_city_name: row.nearest_city_name,
            accommodation_type_names: row.accommodation_type_names,
            bookable: row.bookable,
            camper_types: row.camper_types,
            operator: row.operator,
            photo_url: row.photo_url,
            photos_count: row.photos_count,
            rating: row.rating,
            reviews_count: row.reviews_count,
            slug: row.slug,
            price_low: row.price_low,
            price_high: row.price_high,
            address: row.address,
            updated_at: row.updated_at,
        }
    }
}

pub(super) async fn list_campgrounds(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CampgroundsQuery>,
) -> Result<Json<ApiResponse<Vec<CampgroundItem>>>, ApiError> {
    let rows = campdb_db::list_campgrounds(
        &state.pool,
        normalize_limit(query.limit),
        query.region.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CampgroundItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_campground(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CampgroundItem>>, ApiError> {
    let row = campdb_db::get_campground(&state.pool, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: CampgroundItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct RegionItem {
    name: &'static str,
    bbox: &'static str,
}

pub(super) async fn list_regions(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<RegionItem>>> {
    let data = campdb_core::named_regions()
        .iter()
        .map(|region| RegionItem {
            name: region.name,
            bbox: region.bbox,
        })
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
