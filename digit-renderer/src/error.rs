//! Renderer error types.

use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while encoding or decoding surface images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Encoding the surface failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A data URL or image payload could not be decoded.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// Decoded pixels did not fit a surface.
    #[error(transparent)]
    Canvas(#[from] digit_core::CanvasError),
}
