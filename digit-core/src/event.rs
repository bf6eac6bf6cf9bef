//! Raw pointer input as delivered by the host.
//!
//! Positions here are still in client (viewport) space; the
//! [`CoordinateMapper`](crate::CoordinateMapper) turns them into surface pixels.

use serde::{Deserialize, Serialize};

use crate::error::CanvasResult;
use crate::mapper::SurfaceGeometry;

/// Phase of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerPhase {
    /// Button pressed or finger down.
    Down,
    /// Pointer moved.
    Move,
    /// Button released or finger lifted.
    Up,
    /// Pointer left the surface element.
    Leave,
    /// Gesture cancelled by the platform.
    Cancel,
}

impl PointerPhase {
    /// Whether this phase ends an active stroke.
    #[must_use]
    pub fn ends_stroke(self) -> bool {
        matches!(self, Self::Up | Self::Leave | Self::Cancel)
    }
}

/// A single active touch point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Touch identifier (for multi-touch).
    pub id: u32,
    /// X position in client coordinates.
    pub client_x: f64,
    /// Y position in client coordinates.
    pub client_y: f64,
}

/// Where the position of a pointer event comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "device", rename_all = "lowercase")]
pub enum PointerSource {
    /// Mouse (or pen reported as mouse) position.
    Mouse {
        /// X position in client coordinates.
        client_x: f64,
        /// Y position in client coordinates.
        client_y: f64,
    },
    /// Touch event; only the first active touch is used.
    Touch {
        /// Currently active touch points, possibly empty.
        #[serde(default)]
        touches: Vec<TouchPoint>,
    },
}

impl PointerSource {
    /// Client position of the event, per axis.
    ///
    /// A touch event with no active touch yields `(None, None)`; non-finite
    /// components are reported as missing.
    #[must_use]
    pub fn client_position(&self) -> (Option<f64>, Option<f64>) {
        let (x, y) = match self {
            Self::Mouse { client_x, client_y } => (Some(*client_x), Some(*client_y)),
            Self::Touch { touches } => match touches.first() {
                Some(touch) => (Some(touch.client_x), Some(touch.client_y)),
                None => (None, None),
            },
        };
        (x.filter(|v| v.is_finite()), y.filter(|v| v.is_finite()))
    }
}

/// A pointer event with its phase and position source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerEvent {
    /// Phase of this event.
    pub phase: PointerPhase,
    /// Position source.
    pub source: PointerSource,
    /// Timestamp in milliseconds since the host started.
    #[serde(default)]
    pub timestamp_ms: u64,
}

impl PointerEvent {
    /// Create a mouse event.
    #[must_use]
    pub fn mouse(phase: PointerPhase, client_x: f64, client_y: f64) -> Self {
        Self {
            phase,
            source: PointerSource::Mouse { client_x, client_y },
            timestamp_ms: 0,
        }
    }

    /// Create a touch event from the currently active touches.
    #[must_use]
    pub fn touch(phase: PointerPhase, touches: Vec<TouchPoint>) -> Self {
        Self {
            phase,
            source: PointerSource::Touch { touches },
            timestamp_ms: 0,
        }
    }

    /// Attach a timestamp.
    #[must_use]
    pub fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }
}

/// A recorded sequence of pointer events plus the geometry they were captured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointerScript {
    /// Surface geometry at capture time.
    pub geometry: SurfaceGeometry,
    /// Events in arrival order.
    pub events: Vec<PointerEvent>,
}

impl PointerScript {
    /// Parse a script from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Serialization`](crate::CanvasError::Serialization)
    /// if the JSON does not describe a script.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the script to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_without_points_has_no_position() {
        let event = PointerEvent::touch(PointerPhase::Move, Vec::new());
        assert_eq!(event.source.client_position(), (None, None));
    }

    #[test]
    fn first_touch_wins() {
        let event = PointerEvent::touch(
            PointerPhase::Down,
            vec![
                TouchPoint {
                    id: 3,
                    client_x: 10.0,
                    client_y: 20.0,
                },
                TouchPoint {
                    id: 4,
                    client_x: 99.0,
                    client_y: 99.0,
                },
            ],
        );
        assert_eq!(event.source.client_position(), (Some(10.0), Some(20.0)));
    }

    #[test]
    fn non_finite_mouse_component_is_missing() {
        let event = PointerEvent::mouse(PointerPhase::Move, f64::NAN, 4.0);
        assert_eq!(event.source.client_position(), (None, Some(4.0)));
    }

    #[test]
    fn pointer_event_json_shape() {
        let json = r#"{"phase":"down","source":{"device":"mouse","client_x":1.5,"client_y":2.0}}"#;
        let event: PointerEvent = serde_json::from_str(json).expect("parse");
        assert_eq!(event, PointerEvent::mouse(PointerPhase::Down, 1.5, 2.0));
    }

    #[test]
    fn touch_json_defaults_to_no_touches() {
        let json = r#"{"phase":"up","source":{"device":"touch"},"timestamp_ms":7}"#;
        let event: PointerEvent = serde_json::from_str(json).expect("parse");
        assert_eq!(event.timestamp_ms, 7);
        assert_eq!(event.source.client_position(), (None, None));
    }

    #[test]
    fn ending_phases() {
        assert!(PointerPhase::Up.ends_stroke());
        assert!(PointerPhase::Leave.ends_stroke());
        assert!(PointerPhase::Cancel.ends_stroke());
        assert!(!PointerPhase::Down.ends_stroke());
        assert!(!PointerPhase::Move.ends_stroke());
    }

    #[test]
    fn script_rejects_garbage() {
        assert!(PointerScript::from_json("{ nope }").is_err());
    }
}
