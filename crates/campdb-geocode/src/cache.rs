//! Shared reverse-geocode cache.
//!
//! One entry per rounded coordinate pair, shared read/write by every
//! geocoding worker under a `tokio::sync::Mutex`. A hit must reflect a fully
//! committed prior write, so all access goes through the lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

/// Cache key: coordinates rounded to 5 decimal places (~1 m), so lookups for
/// effectively identical points share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordKey(pub i64, pub i64);

const PRECISION: f64 = 1e5;

impl CoordKey {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self(
            (latitude * PRECISION).round() as i64,
            (longitude * PRECISION).round() as i64,
        )
    }
}

/// Committed lookup outcome for one coordinate pair.
///
/// "Not yet attempted" is represented by the key's absence from the map, so
/// callers and tests can tell "looked up and found nothing" apart from
/// "never looked up". Retry exhaustion is deliberately NOT recorded here —
/// only a confirmed provider answer is (see `ReverseGeocoder::resolve`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeocodeOutcome {
    Resolved(String),
    Absent,
}

/// Handle to the shared cache map; cheap to clone across workers.
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    entries: Arc<Mutex<HashMap<CoordKey, GeocodeOutcome>>>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: CoordKey) -> Option<GeocodeOutcome> {
        self.entries.lock().await.get(&key).cloned()
    }

    pub async fn put(&self, key: CoordKey, outcome: GeocodeOutcome) {
        self.entries.lock().await.insert(key, outcome);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coord_key_rounds_to_five_decimals() {
        assert_eq!(
            CoordKey::new(44.123_456, -110.987_654),
            CoordKey::new(44.123_459, -110.987_651),
        );
        assert_ne!(CoordKey::new(44.1234, -110.0), CoordKey::new(44.1235, -110.0));
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = GeocodeCache::new();
        let key = CoordKey::new(44.0, -110.0);
        assert!(cache.get(key).await.is_none(), "not yet attempted");

        cache
            .put(key, GeocodeOutcome::Resolved("Somewhere, WY".to_owned()))
            .await;
        assert_eq!(
            cache.get(key).await,
            Some(GeocodeOutcome::Resolved("Somewhere, WY".to_owned()))
        );

        cache.put(key, GeocodeOutcome::Absent).await;
        assert_eq!(cache.get(key).await, Some(GeocodeOutcome::Absent));
        assert_eq!(cache.len().await, 1);
    }
}
