use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}
