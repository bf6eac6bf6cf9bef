//! The host-facing drawing pad.
//!
//! A [`Sketchpad`] owns the surface, the stroke engine and the current
//! displayed geometry. Hosts feed it pointer events and read the surface back
//! for display or export.

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, CanvasResult};
use crate::event::{PointerEvent, PointerScript};
use crate::mapper::{ClientRect, CoordinateMapper, MapperConfig, SurfaceGeometry};
use crate::stroke::{EventDisposition, StrokeEngine, StrokeState, StrokeStyle};
use crate::surface::{SurfaceBuffer, DEFAULT_SURFACE_SIZE};

/// Configuration for a [`Sketchpad`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadConfig {
    /// Intrinsic surface width.
    pub width: u32,
    /// Intrinsic surface height.
    pub height: u32,
    /// Coordinate mapping.
    pub mapper: MapperConfig,
    /// Stroke style, fixed for the life of the pad.
    pub style: StrokeStyle,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_SIZE,
            height: DEFAULT_SURFACE_SIZE,
            mapper: MapperConfig::default(),
            style: StrokeStyle::default(),
        }
    }
}

impl PadConfig {
    /// Validate every field.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidDimensions`] for a zero-sized surface and
    /// [`CanvasError::InvalidConfig`] for an unusable mapper or style.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CanvasError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        self.mapper.validate()?;
        self.style.validate()
    }
}

/// Surface, stroke engine and geometry bundled for a host.
#[derive(Debug, Clone)]
pub struct Sketchpad {
    config: PadConfig,
    surface: Option<SurfaceBuffer>,
    engine: StrokeEngine,
    geometry: SurfaceGeometry,
}

impl Sketchpad {
    /// Create a pad with a blank surface.
    ///
    /// The geometry starts as the surface displayed unscaled at the origin;
    /// hosts replace it with [`Sketchpad::set_geometry`] once laid out.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PadConfig) -> CanvasResult<Self> {
        config.validate()?;
        let surface = SurfaceBuffer::new(config.width, config.height)?;
        Ok(Self::assemble(config, Some(surface)))
    }

    /// Create a pad with no rendering context.
    ///
    /// Events still drive the stroke state machine, but drawing and clearing
    /// do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn detached(config: PadConfig) -> CanvasResult<Self> {
        config.validate()?;
        Ok(Self::assemble(config, None))
    }

    fn assemble(config: PadConfig, surface: Option<SurfaceBuffer>) -> Self {
        tracing::debug!(
            width = config.width,
            height = config.height,
            sensitivity = config.mapper.sensitivity,
            attached = surface.is_some(),
            "Sketchpad created"
        );
        Self {
            engine: StrokeEngine::new(CoordinateMapper::new(config.mapper), config.style),
            geometry: SurfaceGeometry::unscaled(config.width, config.height),
            surface,
            config,
        }
    }

    /// The configuration the pad was built with.
    #[must_use]
    pub fn config(&self) -> &PadConfig {
        &self.config
    }

    /// The surface, or `None` when detached.
    #[must_use]
    pub fn surface(&self) -> Option<&SurfaceBuffer> {
        self.surface.as_ref()
    }

    /// Current displayed geometry.
    #[must_use]
    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    /// Update the displayed rectangle (after layout, resize or scroll).
    ///
    /// The intrinsic size always stays that of the surface.
    pub fn set_geometry(&mut self, rect: ClientRect) {
        self.geometry = SurfaceGeometry::new(rect, self.config.width, self.config.height);
    }

    /// Current stroke state.
    #[must_use]
    pub fn stroke_state(&self) -> StrokeState {
        self.engine.state()
    }

    /// Feed one pointer event through the mapper and stroke engine.
    pub fn handle_event(&mut self, event: &PointerEvent) -> EventDisposition {
        self.engine.handle(event, &self.geometry, self.surface.as_mut())
    }

    /// Replay a recorded script against this pad.
    ///
    /// The script's geometry replaces the current rectangle. Returns how many
    /// events were consumed by a gesture.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::ScriptSizeMismatch`] if the script was recorded
    /// against a surface of a different intrinsic size; nothing is drawn.
    pub fn replay(&mut self, script: &PointerScript) -> CanvasResult<usize> {
        let recorded = &script.geometry;
        if (recorded.intrinsic_width, recorded.intrinsic_height)
            != (self.config.width, self.config.height)
        {
            return Err(CanvasError::ScriptSizeMismatch {
                script_width: recorded.intrinsic_width,
                script_height: recorded.intrinsic_height,
                width: self.config.width,
                height: self.config.height,
            });
        }
        self.set_geometry(recorded.rect);
        let consumed = script
            .events
            .iter()
            .filter(|event| self.handle_event(event).should_prevent_default())
            .count();
        tracing::debug!(
            events = script.events.len(),
            consumed,
            "Pointer script replayed"
        );
        Ok(consumed)
    }

    /// Reset the surface to opaque white.
    ///
    /// An in-progress stroke keeps going from its last point.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            surface.reset();
        }
    }
}
