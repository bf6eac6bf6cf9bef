//! # Digit Canvas Core
//!
//! The freehand drawing engine behind Digit Canvas.
//! Compiles to WASM for the browser host and natively for the CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 Sketchpad                   │
//! ├─────────────────────────────────────────────┤
//! │  CoordinateMapper  │  StrokeEngine          │
//! │  - client → pixel  │  - Idle / Drawing      │
//! │  - missing coords  │  - segment raster      │
//! ├─────────────────────────────────────────────┤
//! │  SurfaceBuffer (RGBA, 28×28 by default)     │
//! │  - reset to opaque white                    │
//! │  - capsule coverage rasterizer              │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod mapper;
pub mod pad;
pub mod stroke;
pub mod surface;

pub use error::{CanvasError, CanvasResult};
pub use event::{PointerEvent, PointerPhase, PointerScript, PointerSource, TouchPoint};
pub use mapper::{
    ClientRect, CoordinateMapper, MapperConfig, MissingCoordinatePolicy, PointerSample,
    SurfaceGeometry, DEFAULT_SENSITIVITY,
};
pub use pad::{PadConfig, Sketchpad};
pub use stroke::{EventDisposition, StrokeEngine, StrokeState, StrokeStyle};
pub use surface::{SurfaceBuffer, BLANK_CHANNEL, CHANNELS, DEFAULT_SURFACE_SIZE};

/// Digit core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
