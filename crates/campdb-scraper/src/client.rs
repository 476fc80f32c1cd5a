//! HTTP client for the campground search API.

use std::time::Duration;

use reqwest::Client;

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;
use crate::types::{RawListing, SearchResponse};

/// HTTP client for the paginated campground search endpoint.
///
/// Handles rate limiting (429) and server errors (5xx) as retriable
/// conditions with linear backoff; any other 4xx is a typed, non-retriable
/// [`ScraperError::ClientRequest`]. A successful response with an empty
/// `data` array is the pagination terminator.
pub struct SearchClient {
    client: Client,
    base_url: String,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds for linear backoff: `base_ms × attempt`.
    backoff_base_ms: u64,
}

/// Result of draining one region's pages.
///
/// Pagination stops on the first unrecoverable error, but listings collected
/// from earlier pages are kept and the error is recorded rather than thrown —
/// a failed region must not cost the caller the pages that did arrive.
#[derive(Debug)]
pub struct RegionFetch {
    pub listings: Vec<RawListing>,
    pub failure: Option<ScraperError>,
    /// Pages that returned listings before the region terminated.
    pub pages_fetched: u32,
}

impl SearchClient {
    /// Creates a `SearchClient` with configured timeout, `User-Agent`, and retry policy.
    ///
    /// `base_url` points at the search endpoint itself (injectable so tests can
    /// stand up a local mock server). `max_retries` is the number of additional
    /// attempts after the first failure for retriable errors; set `0` to
    /// disable retries.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(
        base_url: impl Into<String>,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            max_retries,
            backoff_base_ms,
        })
    }

    /// Fetches one page of search results for a bounding box, with automatic
    /// retry on transient errors.
    ///
    /// A `200` with an empty `data` array returns `Ok(vec![])`; callers treat
    /// that as the end of the region's pagination.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`] — HTTP 429 after all retries exhausted.
    /// - [`ScraperError::ServerStatus`] — 5xx after all retries exhausted.
    /// - [`ScraperError::ClientRequest`] — any other 4xx (not retried).
    /// - [`ScraperError::Http`] — network failure after all retries exhausted.
    /// - [`ScraperError::Deserialize`] — response body is not valid JSON (not retried).
    pub async fn fetch_page(
        &self,
        bbox: &str,
        page_number: u32,
        page_size: u32,
    ) -> Result<Vec<RawListing>, ScraperError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .get(&self.base_url)
                .query(&[
                    ("filter[search][drive_time]", "any"),
                    ("filter[search][air_quality]", "any"),
                    ("filter[search][electric_amperage]", "any"),
                    ("filter[search][max_vehicle_length]", "any"),
                    ("filter[search][price]", "any"),
                    ("filter[search][rating]", "any"),
                    ("filter[search][bbox]", bbox),
                    ("sort", "recommended"),
                ])
                .query(&[("page[number]", page_number), ("page[size]", page_size)])
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;

            let status = response.status();
            let url = response.url().to_string();

            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                return Err(ScraperError::RateLimited { url });
            }

            if status.is_server_error() {
                return Err(ScraperError::ServerStatus {
                    status: status.as_u16(),
                    url,
                });
            }

            if status.is_client_error() {
                return Err(ScraperError::ClientRequest {
                    status: status.as_u16(),
                    url,
                });
            }

            let body = response.text().await?;
            let parsed = serde_json::from_str::<SearchResponse>(&body).map_err(|e| {
                ScraperError::Deserialize {
                    context: format!("search page {page_number} for bbox {bbox}"),
                    source: e,
                }
            })?;

            Ok(parsed.data)
        })
        .await
    }

    /// Drains a region's pages in strictly increasing order starting at 1.
    ///
    /// Pagination state lives in the page number, so pages are fetched one at
    /// a time and never in parallel. A fixed `inter_page_delay_ms` is applied
    /// after every page but the first to respect the provider's implicit rate
    /// limit. Stops on an empty page, when `max_pages` is reached, or on the
    /// first unrecoverable page error (recorded in [`RegionFetch::failure`]).
    pub async fn fetch_region(
        &self,
        bbox: &str,
        page_size: u32,
        max_pages: Option<u32>,
        inter_page_delay_ms: u64,
    ) -> RegionFetch {
        let mut listings: Vec<RawListing> = Vec::new();
        let mut pages_fetched = 0u32;
        let mut page = 1u32;

        loop {
            if let Some(cap) = max_pages {
                if page > cap {
                    tracing::info!(bbox, cap, "reached page cap for region");
                    break;
                }
            }

            if page > 1 && inter_page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(inter_page_delay_ms)).await;
            }

            match self.fetch_page(bbox, page, page_size).await {
                Ok(batch) if batch.is_empty() => break,
                Ok(batch) => {
                    tracing::debug!(bbox, page, listings = batch.len(), "fetched search page");
                    listings.extend(batch);
                    pages_fetched += 1;
                    page += 1;
                }
                Err(err) => {
                    tracing::warn!(bbox, page, error = %err, "region pagination stopped on error");
                    return RegionFetch {
                        listings,
                        failure: Some(err),
                        pages_fetched,
                    };
                }
            }
        }

        RegionFetch {
            listings,
            failure: None,
            pages_fetched,
        }
    }
}
