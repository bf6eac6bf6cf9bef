//! Gateway error types.

use digit_renderer::RenderError;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur when exporting or classifying a drawing.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The classifier URL provided is invalid.
    #[error("invalid classifier URL: {0}")]
    InvalidUrl(String),

    /// No classifier endpoint was configured.
    #[error("no classifier endpoint configured (set CLASSIFIER_ENDPOINT)")]
    MissingEndpoint,

    /// HTTP layer failed (connection refused, DNS, TLS, ...).
    #[error("classifier HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed.
    #[error("failed to encode classifier payload: {0}")]
    Json(#[from] serde_json::Error),

    /// The classifier answered with a non-success status.
    #[error("classifier returned HTTP {code}: {body}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Response body, as text.
        body: String,
    },

    /// The surface could not be encoded.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// The host has no rendering context to export from.
    #[error("no surface to export")]
    NoSurface,

    /// Writing a local download failed.
    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),

    /// The host could not start a download.
    #[error("download failed: {0}")]
    Download(String),
}
