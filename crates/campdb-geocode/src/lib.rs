pub mod cache;
pub mod client;
pub mod error;

pub use cache::{CoordKey, GeocodeCache, GeocodeOutcome};
pub use client::ReverseGeocoder;
pub use error::GeocodeError;
