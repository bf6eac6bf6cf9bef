//! Client-space to surface-pixel coordinate mapping.

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, CanvasResult};
use crate::event::{PointerEvent, PointerSource};

/// Default input sensitivity divisor.
///
/// One unit of client movement maps to `1 / DEFAULT_SENSITIVITY` of the
/// display-to-intrinsic ratio, which squeezes large gestures into the small
/// surface.
pub const DEFAULT_SENSITIVITY: f64 = 12.0;

/// A position in surface-pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerSample {
    /// X in surface pixels.
    pub x: f64,
    /// Y in surface pixels.
    pub y: f64,
}

impl PointerSample {
    /// Create a sample.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Bounding rectangle of the surface element in client space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Displayed width.
    pub width: f64,
    /// Displayed height.
    pub height: f64,
}

/// Displayed placement plus intrinsic resolution of the surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    /// Where the surface is displayed.
    pub rect: ClientRect,
    /// Backing width in pixels.
    pub intrinsic_width: u32,
    /// Backing height in pixels.
    pub intrinsic_height: u32,
}

impl SurfaceGeometry {
    /// Create a geometry.
    #[must_use]
    pub fn new(rect: ClientRect, intrinsic_width: u32, intrinsic_height: u32) -> Self {
        Self {
            rect,
            intrinsic_width,
            intrinsic_height,
        }
    }

    /// Geometry of a surface displayed at its intrinsic size at the origin.
    #[must_use]
    pub fn unscaled(width: u32, height: u32) -> Self {
        Self::new(
            ClientRect {
                left: 0.0,
                top: 0.0,
                width: f64::from(width),
                height: f64::from(height),
            },
            width,
            height,
        )
    }
}

/// What to do with an axis whose position cannot be determined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCoordinatePolicy {
    /// Substitute 0 for the missing axis and keep the sample.
    #[default]
    ZeroFill,
    /// Drop the whole sample.
    Ignore,
}

/// Mapper configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Input sensitivity divisor K.
    pub sensitivity: f64,
    /// Handling of undeterminable axes.
    #[serde(default)]
    pub missing: MissingCoordinatePolicy,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            missing: MissingCoordinatePolicy::ZeroFill,
        }
    }
}

impl MapperConfig {
    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the sensitivity is not a
    /// positive finite number.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.sensitivity.is_finite() && self.sensitivity > 0.0 {
            Ok(())
        } else {
            Err(CanvasError::InvalidConfig(format!(
                "sensitivity must be positive and finite, got {}",
                self.sensitivity
            )))
        }
    }
}

/// Converts client-space pointer positions to surface pixels.
///
/// `surface = (client - rect_origin) * intrinsic / (displayed * K)` per axis.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateMapper {
    config: MapperConfig,
}

impl CoordinateMapper {
    /// Create a mapper with the given configuration.
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// The mapper configuration.
    #[must_use]
    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Per-axis scale factors, `None` for an axis with degenerate geometry.
    #[must_use]
    pub fn scale(&self, geometry: &SurfaceGeometry) -> (Option<f64>, Option<f64>) {
        let k = self.config.sensitivity;
        (
            axis_scale(geometry.intrinsic_width, geometry.rect.width, k),
            axis_scale(geometry.intrinsic_height, geometry.rect.height, k),
        )
    }

    /// Map a pointer event to a surface sample.
    ///
    /// Returns `None` only under [`MissingCoordinatePolicy::Ignore`] when an
    /// axis cannot be determined.
    #[must_use]
    pub fn map(&self, event: &PointerEvent, geometry: &SurfaceGeometry) -> Option<PointerSample> {
        self.map_source(&event.source, geometry)
    }

    /// Map a position source to a surface sample.
    #[must_use]
    pub fn map_source(
        &self,
        source: &PointerSource,
        geometry: &SurfaceGeometry,
    ) -> Option<PointerSample> {
        let (client_x, client_y) = source.client_position();
        let (scale_x, scale_y) = self.scale(geometry);
        let x = map_axis(client_x, geometry.rect.left, scale_x);
        let y = map_axis(client_y, geometry.rect.top, scale_y);

        match self.config.missing {
            MissingCoordinatePolicy::ZeroFill => {
                Some(PointerSample::new(x.unwrap_or(0.0), y.unwrap_or(0.0)))
            }
            MissingCoordinatePolicy::Ignore => Some(PointerSample::new(x?, y?)),
        }
    }
}

fn axis_scale(intrinsic: u32, displayed: f64, sensitivity: f64) -> Option<f64> {
    if !(displayed.is_finite() && displayed > 0.0) {
        return None;
    }
    let scale = f64::from(intrinsic) / (displayed * sensitivity);
    scale.is_finite().then_some(scale)
}

fn map_axis(client: Option<f64>, origin: f64, scale: Option<f64>) -> Option<f64> {
    let value = (client? - origin) * scale?;
    value.is_finite().then_some(value)
}
