//! # Digit Canvas Renderer
//!
//! Turns a [`SurfaceBuffer`](digit_core::SurfaceBuffer) into bytes other
//! systems understand.
//!
//! ```text
//! SurfaceBuffer ──▶ SurfaceExporter ──▶ ExportedImage ──▶ data:image/png;base64,...
//!                   (PNG | JPEG)
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod data_url;
pub mod error;
pub mod export;

pub use data_url::{decode_data_url, encode_data_url, surface_from_data_url, surface_from_image_bytes};
pub use error::{RenderError, RenderResult};
pub use export::{serialize, ExportConfig, ExportFormat, ExportedImage, SurfaceExporter};
