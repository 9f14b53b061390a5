use crate::snapshot::Domain;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Spectrum API request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The payload did not match the expected schema. `body` keeps the raw
    /// response for diagnostics.
    #[error("Failed to decode Spectrum response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Invalid name filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("No snapshot cached for the {0} domain")]
    SnapshotNotFound(Domain),

    #[error("Collection failed: {0}")]
    Collection(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics registry error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    pub(crate) fn decode(source: serde_json::Error, raw: &[u8]) -> Self {
        Self::Decode {
            source,
            body: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ExporterError>;
