//! Error types surfaced by the exporter.

use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the upstream funding data API.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Hyperliquid API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Invalid response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Whether another attempt could succeed (transport errors, 429 and 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(_) => true,
            FetchError::Status { status, .. } => {
                status.is_server_error() || *status == reqwest::StatusCode::TOO_MANY_REQUESTS
            }
            FetchError::Decode { .. } => false,
        }
    }
}

/// Terminating failure of an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Error fetching chunk {chunk}: {source}")]
    Fetch {
        chunk: usize,
        #[source]
        source: FetchError,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize CSV for {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
