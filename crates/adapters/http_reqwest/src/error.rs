//! HTTP adapter error types.

use sensordb_domain::error::SensorDbError;

/// Errors originating from the HTTP transport.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The configured base URL does not parse.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Building the client, sending, or decoding the body failed.
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),
}

impl From<HttpError> for SensorDbError {
    fn from(err: HttpError) -> Self {
        Self::Service(Box::new(err))
    }
}
