//! Surface export to image formats.
//!
//! Encodes the exact pixels of a [`SurfaceBuffer`] with no resampling. PNG
//! keeps the alpha channel; JPEG composites onto the configured background.

use digit_core::SurfaceBuffer;
use image::ImageEncoder;

use crate::data_url::encode_data_url;
use crate::error::{RenderError, RenderResult};

/// Export output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// PNG image.
    #[default]
    Png,
    /// JPEG image.
    Jpeg,
}

impl ExportFormat {
    /// MIME type of the encoded bytes.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Conventional file extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// Configuration for surface export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Background color JPEG output is flattened onto.
    pub background: [u8; 4],
    /// JPEG quality 1-100 (default: 85).
    pub jpeg_quality: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            background: [255, 255, 255, 255],
            jpeg_quality: 85,
        }
    }
}

/// An encoded snapshot of a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    format: ExportFormat,
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl ExportedImage {
    /// Encoding used.
    #[must_use]
    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// MIME type of [`ExportedImage::bytes`].
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoded bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Take the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Render as `data:<mime>;base64,<payload>`.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        encode_data_url(self.mime_type(), &self.bytes)
    }
}

/// Encodes surfaces to image bytes.
pub struct SurfaceExporter {
    config: ExportConfig,
}

impl SurfaceExporter {
    /// Create a new exporter with the given configuration.
    #[must_use]
    pub fn new(config: ExportConfig) -> Self {
        Self { config }
    }

    /// Create an exporter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ExportConfig::default())
    }

    /// Export a surface to the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn export(
        &self,
        surface: &SurfaceBuffer,
        format: ExportFormat,
    ) -> RenderResult<ExportedImage> {
        let bytes = match format {
            ExportFormat::Png => Self::render_to_png(surface)?,
            ExportFormat::Jpeg => self.render_to_jpeg(surface)?,
        };
        tracing::debug!(
            format = format.mime_type(),
            width = surface.width(),
            height = surface.height(),
            size = bytes.len(),
            "Surface exported"
        );
        Ok(ExportedImage {
            format,
            width: surface.width(),
            height: surface.height(),
            bytes,
        })
    }

    /// Encode the surface as RGBA PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn render_to_png(surface: &SurfaceBuffer) -> RenderResult<Vec<u8>> {
        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder = image::codecs::png::PngEncoder::new(&mut buf);
        encoder
            .write_image(
                surface.pixels(),
                surface.width(),
                surface.height(),
                image::ColorType::Rgba8.into(),
            )
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))?;
        Ok(buf.into_inner())
    }

    /// Encode the surface as RGB JPEG, flattened onto the background.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn render_to_jpeg(&self, surface: &SurfaceBuffer) -> RenderResult<Vec<u8>> {
        let bg = &self.config.background;
        let mut rgb_data = Vec::with_capacity(surface.pixels().len() / 4 * 3);
        for pixel in surface.pixels().chunks_exact(4) {
            let alpha = f32::from(pixel[3]) / 255.0;
            let inv = 1.0 - alpha;
            for (&channel, &under) in pixel[..3].iter().zip(&bg[..3]) {
                let value = f32::from(channel).mul_add(alpha, f32::from(under) * inv);
                rgb_data.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }

        let mut buf = std::io::Cursor::new(Vec::new());
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, self.config.jpeg_quality);
        encoder
            .write_image(
                &rgb_data,
                surface.width(),
                surface.height(),
                image::ColorType::Rgb8.into(),
            )
            .map_err(|e| RenderError::Export(format!("JPEG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}

/// Serialize a surface with the default exporter.
///
/// # Errors
///
/// Returns an error if encoding fails.
pub fn serialize(surface: &SurfaceBuffer, format: ExportFormat) -> RenderResult<ExportedImage> {
    SurfaceExporter::with_defaults().export(surface, format)
}
