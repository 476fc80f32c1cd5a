//! Wire types for the upstream campground search API.
//!
//! The response is a JSON:API-style envelope: a `data` array of listings,
//! each with an `id`, `type`, an untyped `attributes` map, and `links.self`.
//! Everything except the envelope shape is left unvalidated here; the
//! normalizer owns validation.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Response envelope for one search page.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<RawListing>,
}

/// One raw listing as returned by the search API.
///
/// `id` is kept as a raw `Value` — the normalizer rejects listings whose id
/// is missing or not a string rather than failing the whole page here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawListing {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(rename = "type", default)]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub links: Option<Links>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_parses_with_untyped_attributes() {
        let body = serde_json::json!({
            "data": [{
                "id": "12345",
                "type": "campgrounds",
                "attributes": {"name": "Pine Hollow", "latitude": 44.1},
                "links": {"self": "https://example.com/campgrounds/12345"}
            }]
        });
        let parsed: SearchResponse = serde_json::from_value(body).expect("parse envelope");
        assert_eq!(parsed.data.len(), 1);
        let listing = &parsed.data[0];
        assert_eq!(listing.id.as_ref().and_then(Value::as_str), Some("12345"));
        assert_eq!(listing.attributes["name"], "Pine Hollow");
        assert_eq!(
            listing.links.as_ref().and_then(|l| l.self_url.as_deref()),
            Some("https://example.com/campgrounds/12345")
        );
    }

    #[test]
    fn envelope_tolerates_missing_fields() {
        let parsed: SearchResponse =
            serde_json::from_value(serde_json::json!({"data": [{}]})).expect("parse");
        assert!(parsed.data[0].id.is_none());
        assert!(parsed.data[0].attributes.is_empty());
    }

    #[test]
    fn empty_envelope_has_no_listings() {
        let parsed: SearchResponse = serde_json::from_value(serde_json::json!({})).expect("parse");
        assert!(parsed.data.is_empty());
    }
}
