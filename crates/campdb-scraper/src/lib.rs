pub mod client;
pub mod error;
pub mod normalize;
pub mod retry;
pub mod types;

pub use client::{RegionFetch, SearchClient};
pub use error::ScraperError;
pub use campdb_core::CampgroundRecord;
pub use normalize::{process_listing, ValidationError};
pub use types::{RawListing, SearchResponse};
