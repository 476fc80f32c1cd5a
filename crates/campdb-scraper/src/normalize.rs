//! Normalization of raw search listings into validated campground records.

use campdb_core::CampgroundRecord;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::RawListing;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listing has no usable id")]
    MissingId,
}

/// Converts one raw listing into a validated [`CampgroundRecord`].
///
/// The only fatal condition is a missing, empty, or non-string `id` — that
/// listing is dropped (counted by the caller, never raised). Every other
/// malformed attribute degrades to its documented default: empty lists,
/// `false` for `bookable`, `0` for counts, `None` for the rest. Out-of-range
/// coordinates, inverted price pairs, and out-of-range ratings are cleared
/// rather than dropping the record, since the identity is intact.
///
/// # Errors
///
/// Returns [`ValidationError::MissingId`] when the listing carries no usable id.
pub fn process_listing(raw: &RawListing) -> Result<CampgroundRecord, ValidationError> {
    let id = raw
        .id
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ValidationError::MissingId)?
        .to_owned();

    let attrs = &raw.attributes;

    let (latitude, longitude) = validated_coordinates(
        &id,
        opt_f64(attrs, "latitude"),
        opt_f64(attrs, "longitude"),
    );
    let (price_low, price_high) =
        validated_prices(&id, opt_f64(attrs, "price-low"), opt_f64(attrs, "price-high"));

    let rating = opt_f64(attrs, "rating").filter(|r| {
        let ok = (0.0..=5.0).contains(r);
        if !ok {
            tracing::warn!(listing_id = %id, rating = r, "discarding out-of-range rating");
        }
        ok
    });

    Ok(CampgroundRecord {
        record_type: raw.listing_type.clone(),
        links_self: raw.links.as_ref().and_then(|l| l.self_url.clone()),
        name: opt_str(attrs, "name"),
        latitude,
        longitude,
        region_name: opt_str(attrs, "region-name"),
        administrative_area: opt_str(attrs, "administrative-area"),
        nearest_city_name: opt_str(attrs, "nearest-city-name"),
        accommodation_type_names: str_list(attrs, "accommodation-type-names"),
        bookable: attrs.get("bookable").and_then(Value::as_bool).unwrap_or(false),
        camper_types: str_list(attrs, "camper-types"),
        operator: opt_str(attrs, "operator"),
        photo_url: opt_str(attrs, "photo-url"),
        photo_urls: str_list(attrs, "photo-urls"),
        photos_count: opt_count(attrs, "photos-count"),
        rating,
        reviews_count: opt_count(attrs, "reviews-count"),
        slug: opt_str(attrs, "slug"),
        price_low,
        price_high,
        availability_updated_at: opt_timestamp(attrs, "availability-updated-at"),
        address: None,
        id,
    })
}

/// Clears coordinates that fall outside WGS84 ranges; a bad coordinate pair
/// does not drop the record.
fn validated_coordinates(
    id: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    let lat_ok = lat.is_none_or(|v| (-90.0..=90.0).contains(&v));
    let lon_ok = lon.is_none_or(|v| (-180.0..=180.0).contains(&v));
    if lat_ok && lon_ok {
        (lat, lon)
    } else {
        tracing::warn!(listing_id = %id, ?lat, ?lon, "discarding out-of-range coordinates");
        (None, None)
    }
}

/// Clears an inverted price pair; individual prices are fine on their own.
fn validated_prices(
    id: &str,
    low: Option<f64>,
    high: Option<f64>,
) -> (Option<f64>, Option<f64>) {
    if let (Some(l), Some(h)) = (low, high) {
        if l > h {
            tracing::warn!(listing_id = %id, low = l, high = h, "discarding inverted price pair");
            return (None, None);
        }
    }
    (low, high)
}

fn opt_str(attrs: &Map<String, Value>, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

fn opt_f64(attrs: &Map<String, Value>, key: &str) -> Option<f64> {
    attrs.get(key).and_then(Value::as_f64)
}

fn opt_count(attrs: &Map<String, Value>, key: &str) -> i32 {
    attrs
        .get(key)
        .and_then(Value::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0)
}

fn str_list(attrs: &Map<String, Value>, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn opt_timestamp(attrs: &Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}
