//! The validated campground domain record.

use chrono::{DateTime, Utc};

/// A validated, flat campground record ready for persistence.
///
/// Invariants (enforced by the scraper's normalizer before a record is ever
/// constructed):
/// - `id` is non-empty and globally unique in storage;
/// - coordinates, when present, lie in WGS84 ranges;
/// - `price_low <= price_high` when both are present;
/// - `rating`, when present, lies in `0.0..=5.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct CampgroundRecord {
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
    /// Reverse-geocoded address; filled inline during a scan or by the
    /// deferred backfill, `None` when geocoding failed or never ran.
    pub address: Option<String>,
}

impl CampgroundRecord {
    /// A minimal record carrying only the mandatory identity field; every
    /// other field takes its documented default.
    #[must_use]
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            record_type: None,
            links_self: None,
            name: None,
            latitude: None,
            longitude: None,
            region_name: None,
            administrative_area: None,
            nearest_city_name: None,
            accommodation_type_names: Vec::new(),
            bookable: false,
            camper_types: Vec::new(),
            operator: None,
            photo_url: None,
            photo_urls: Vec::new(),
            photos_count: 0,
            rating: None,
            reviews_count: 0,
            slug: None,
            price_low: None,
            price_high: None,
            availability_updated_at: None,
            address: None,
        }
    }
}
