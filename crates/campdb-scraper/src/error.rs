use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {url}")]
    RateLimited { url: String },

    #[error("server error {status} from {url}")]
    ServerStatus { status: u16, url: String },

    #[error("request rejected with status {status} by {url}")]
    ClientRequest { status: u16, url: String },
}
