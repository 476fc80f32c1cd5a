use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from reverse-geocode endpoint")]
    UnexpectedStatus { status: u16 },

    #[error("reverse-geocode response did not parse: {0}")]
    Deserialize(#[from] serde_json::Error),
}
