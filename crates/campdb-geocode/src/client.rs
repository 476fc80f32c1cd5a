//! Reverse-geocoding client with a shared cache and bounded retries.

use std::collections::HashMap;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::Deserialize;

use crate::cache::{CoordKey, GeocodeCache, GeocodeOutcome};
use crate::error::GeocodeError;

/// Success body from the reverse endpoint; `display_name` is the formatted
/// address, and its absence means the provider found no address there.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Reverse geocoder backed by a Nominatim-style `/reverse` endpoint.
///
/// Every lookup goes through the shared [`GeocodeCache`] first; a hit
/// (resolved or confirmed-absent) costs no network call. On a miss the
/// worker self-paces with `min_interval_ms` before each upstream request.
/// Pacing is per worker, not global — see [`Self::resolve_many`].
pub struct ReverseGeocoder {
    client: Client,
    base_url: String,
    cache: GeocodeCache,
    max_retries: u32,
    backoff_base_ms: u64,
    min_interval_ms: u64,
}

impl ReverseGeocoder {
    /// Creates a geocoder with its own freshly constructed cache.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
        min_interval_ms: u64,
    ) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            cache: GeocodeCache::new(),
            max_retries,
            backoff_base_ms,
            min_interval_ms,
        })
    }

    /// The shared cache handle, exposed for tests and cache-aware callers.
    #[must_use]
    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Resolves one coordinate pair to a formatted address.
    ///
    /// Returns `Ok(None)` when the provider confirms there is no address
    /// (cached as [`GeocodeOutcome::Absent`] so the next call is free).
    /// Transient failures are retried with a per-attempt increasing delay;
    /// exhaustion returns the error WITHOUT caching, so a later call with the
    /// same coordinates gets a fresh attempt.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] after all retries are exhausted.
    pub async fn resolve(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<String>, GeocodeError> {
        let key = CoordKey::new(latitude, longitude);

        match self.cache.get(key).await {
            Some(GeocodeOutcome::Resolved(address)) => return Ok(Some(address)),
            Some(GeocodeOutcome::Absent) => return Ok(None),
            None => {}
        }

        let mut attempt = 0u32;
        loop {
            if self.min_interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.min_interval_ms)).await;
            }

            match self.request(latitude, longitude).await {
                Ok(Some(address)) => {
                    self.cache
                        .put(key, GeocodeOutcome::Resolved(address.clone()))
                        .await;
                    return Ok(Some(address));
                }
                Ok(None) => {
                    self.cache.put(key, GeocodeOutcome::Absent).await;
                    return Ok(None);
                }
                Err(err) => {
                    if attempt >= self.max_retries {
                        tracing::warn!(
                            latitude,
                            longitude,
                            error = %err,
                            "reverse geocode failed after retries; leaving uncached"
                        );
                        return Err(err);
                    }
                    attempt += 1;
                    let delay_ms = self.backoff_base_ms.saturating_mul(u64::from(attempt));
                    tracing::debug!(
                        attempt,
                        delay_ms,
                        error = %err,
                        "transient reverse-geocode error — retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// Resolves a batch of coordinate pairs across a bounded worker pool.
    ///
    /// Coordinates are deduplicated by rounded key before dispatch. Each
    /// worker runs the single-key path independently, so pacing is per worker:
    /// the aggregate upstream request rate grows roughly linearly with
    /// `worker_count`, and callers picking a high count can exceed the
    /// provider's true limit even though each worker self-paces.
    ///
    /// Lookups that fail after retries map to `None`, same as confirmed-absent
    /// — batch callers only care whether an address materialized.
    pub async fn resolve_many(
        &self,
        coords: &[(f64, f64)],
        worker_count: usize,
    ) -> HashMap<CoordKey, Option<String>> {
        let mut unique: HashMap<CoordKey, (f64, f64)> = HashMap::new();
        for &(lat, lon) in coords {
            unique.entry(CoordKey::new(lat, lon)).or_insert((lat, lon));
        }

        let workers = worker_count.max(1);
        stream::iter(unique)
            .map(|(key, (lat, lon))| async move {
                let address = match self.resolve(lat, lon).await {
                    Ok(found) => found,
                    Err(err) => {
                        tracing::warn!(lat, lon, error = %err, "batch geocode entry failed");
                        None
                    }
                };
                (key, address)
            })
            .buffer_unordered(workers)
            .collect()
            .await
    }

    /// One upstream request; `Ok(None)` means a 200 without an address.
    async fn request(&self, latitude: f64, longitude: f64) -> Result<Option<String>, GeocodeError> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .query(&[
                ("format", "json"),
                ("zoom", "18"),
                ("addressdetails", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let parsed: ReverseResponse = serde_json::from_str(&body)?;
        Ok(parsed.display_name)
    }
}
