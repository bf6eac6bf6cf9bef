//! Stroke state machine.
//!
//! ```text
//!            down                    move (rasterize last → current)
//!   Idle ───────────▶ Drawing ◀──────────────┐
//!    ▲                  │  └─────────────────┘
//!    └──────────────────┘
//!       up / leave / cancel
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CanvasError, CanvasResult};
use crate::event::{PointerEvent, PointerPhase};
use crate::mapper::{CoordinateMapper, PointerSample, SurfaceGeometry};
use crate::surface::SurfaceBuffer;

/// Style every segment is stroked with.
///
/// Caps and joins are always round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    /// Stroke color as RGBA.
    pub color: [u8; 4],
    /// Line width in surface pixels.
    pub width: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: [0, 0, 0, 255],
            width: 1.0,
        }
    }
}

impl StrokeStyle {
    /// Check the style is drawable.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::InvalidConfig`] if the width is not a positive
    /// finite number.
    pub fn validate(&self) -> CanvasResult<()> {
        if self.width.is_finite() && self.width > 0.0 {
            Ok(())
        } else {
            Err(CanvasError::InvalidConfig(format!(
                "stroke width must be positive and finite, got {}",
                self.width
            )))
        }
    }
}

/// Where the engine is in a gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum StrokeState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// A gesture is in progress.
    Drawing {
        /// Most recent sample; the next segment starts here.
        last_point: PointerSample,
    },
}

impl StrokeState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    /// The last sample of the current gesture.
    #[must_use]
    pub fn last_point(&self) -> Option<PointerSample> {
        match self {
            Self::Idle => None,
            Self::Drawing { last_point } => Some(*last_point),
        }
    }
}

/// What the host should do with the original platform event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// The engine did nothing; let the platform handle it.
    Ignored,
    /// The event belongs to a gesture; suppress default handling (scrolling).
    Consumed,
}

impl EventDisposition {
    /// Whether the host should call `preventDefault`.
    #[must_use]
    pub fn should_prevent_default(self) -> bool {
        self == Self::Consumed
    }
}

/// Turns pointer events into rasterized segments.
#[derive(Debug, Clone, Default)]
pub struct StrokeEngine {
    mapper: CoordinateMapper,
    style: StrokeStyle,
    state: StrokeState,
    segments: u64,
}

impl StrokeEngine {
    /// Create an idle engine.
    #[must_use]
    pub fn new(mapper: CoordinateMapper, style: StrokeStyle) -> Self {
        Self {
            mapper,
            style,
            state: StrokeState::Idle,
            segments: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> StrokeState {
        self.state
    }

    /// The fixed stroke style.
    #[must_use]
    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// The coordinate mapper.
    #[must_use]
    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// Segments rasterized in the current gesture.
    #[must_use]
    pub fn segment_count(&self) -> u64 {
        self.segments
    }

    /// Map and dispatch a raw pointer event.
    ///
    /// With no surface, state still advances but nothing is drawn.
    pub fn handle(
        &mut self,
        event: &PointerEvent,
        geometry: &SurfaceGeometry,
        surface: Option<&mut SurfaceBuffer>,
    ) -> EventDisposition {
        match event.phase {
            PointerPhase::Down => self.pointer_down(self.mapper.map(event, geometry)),
            PointerPhase::Move => {
                if !self.state.is_active() {
                    return EventDisposition::Ignored;
                }
                self.pointer_move(self.mapper.map(event, geometry), surface)
            }
            PointerPhase::Up | PointerPhase::Leave | PointerPhase::Cancel => self.pointer_up(),
        }
    }

    /// Start a gesture at `sample`.
    ///
    /// A down while already drawing restarts the gesture at the new sample.
    /// An unmappable sample leaves the engine idle.
    pub fn pointer_down(&mut self, sample: Option<PointerSample>) -> EventDisposition {
        let Some(sample) = sample else {
            self.state = StrokeState::Idle;
            return EventDisposition::Ignored;
        };
        if self.state.is_active() {
            tracing::debug!("Pointer down during active stroke; restarting");
        }
        self.state = StrokeState::Drawing { last_point: sample };
        self.segments = 0;
        tracing::trace!(x = sample.x, y = sample.y, "Stroke started");
        EventDisposition::Consumed
    }

    /// Extend the gesture to `sample`, stroking from the previous sample.
    ///
    /// No-op while idle. An unmappable sample is skipped and the gesture
    /// continues from the previous point.
    pub fn pointer_move(
        &mut self,
        sample: Option<PointerSample>,
        surface: Option<&mut SurfaceBuffer>,
    ) -> EventDisposition {
        let StrokeState::Drawing { last_point } = self.state else {
            return EventDisposition::Ignored;
        };
        let Some(current) = sample else {
            return EventDisposition::Consumed;
        };

        if let Some(surface) = surface {
            surface.stroke_segment(last_point, current, &self.style);
            self.segments += 1;
        }
        self.state = StrokeState::Drawing {
            last_point: current,
        };
        EventDisposition::Consumed
    }

    /// End the gesture and forget the last sample.
    pub fn pointer_up(&mut self) -> EventDisposition {
        match std::mem::take(&mut self.state) {
            StrokeState::Idle => EventDisposition::Ignored,
            StrokeState::Drawing { .. } => {
                tracing::debug!(segments = self.segments, "Stroke finished");
                EventDisposition::Consumed
            }
        }
    }
}
