//! Error types for drawing operations.

use thiserror::Error;

/// Result type for drawing operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Errors that can occur while building or mutating a surface.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// Surface dimensions must both be non-zero.
    #[error("Invalid surface dimensions: {width}x{height}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// A whole-buffer write did not match the surface size.
    #[error("Pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferLength {
        /// Bytes the surface holds (`width * height * 4`).
        expected: usize,
        /// Bytes that were supplied.
        actual: usize,
    },

    /// A pointer script was recorded against a surface of another size.
    #[error("Script recorded for a {script_width}x{script_height} surface, pad is {width}x{height}")]
    ScriptSizeMismatch {
        /// Intrinsic width the script was recorded with.
        script_width: u32,
        /// Intrinsic height the script was recorded with.
        script_height: u32,
        /// Width of the pad replaying it.
        width: u32,
        /// Height of the pad replaying it.
        height: u32,
    },

    /// Configuration value outside the usable range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Pointer script serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
