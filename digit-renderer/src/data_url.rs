//! `data:` URL encoding and decoding.
//!
//! Supports URLs like `data:image/png;base64,iVBORw0KGgo...`.

use base64::Engine;
use digit_core::SurfaceBuffer;

use crate::error::{RenderError, RenderResult};

/// Build a base64 `data:` URL.
#[must_use]
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{payload}")
}

/// Split a base64 `data:` URL into its MIME type and decoded bytes.
///
/// # Errors
///
/// Returns an error if the URL is malformed or not base64 encoded.
pub fn decode_data_url(url: &str) -> RenderResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| RenderError::Resource("Not a data URL".to_string()))?;

    let (metadata, encoded) = rest
        .split_once(',')
        .ok_or_else(|| RenderError::Resource("Invalid data URL: missing comma".to_string()))?;

    let mime = metadata
        .strip_suffix(";base64")
        .ok_or_else(|| RenderError::Resource("Only base64 data URLs are supported".to_string()))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| RenderError::Resource(format!("Failed to decode base64: {e}")))?;

    Ok((mime.to_string(), bytes))
}

/// Decode an encoded image back into a surface.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image or have a zero
/// dimension.
pub fn surface_from_image_bytes(bytes: &[u8]) -> RenderResult<SurfaceBuffer> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let rgba = img.to_rgba8();
    let mut surface = SurfaceBuffer::new(rgba.width(), rgba.height())?;
    surface.replace_pixels(rgba.into_raw())?;
    Ok(surface)
}

/// Decode a `data:` URL image back into a surface.
///
/// # Errors
///
/// Returns an error if the URL or the image it carries cannot be decoded.
pub fn surface_from_data_url(url: &str) -> RenderResult<SurfaceBuffer> {
    let (_, bytes) = decode_data_url(url)?;
    surface_from_image_bytes(&bytes)
}
