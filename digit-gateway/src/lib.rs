//! # Digit Canvas Gateway
//!
//! Everything that leaves the drawing pad goes through the [`ExportGateway`]:
//! local saves as `drawing.png` and submissions to a remote classifier whose
//! answer is published as a [`PredictionView`].
//!
//! The gateway is runtime agnostic. Its futures are `?Send` and it only uses
//! tokio's channel primitives, so the same code runs on the browser event loop
//! and on a native tokio runtime.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classifier;
pub mod config;
pub mod download;
pub mod error;
pub mod gateway;

pub use classifier::{label_from_body, Classifier, HttpClassifier, PredictionRequest};
pub use config::{
    FailurePolicy, GatewayConfig, DEFAULT_DOWNLOAD_NAME, DEFAULT_USER_AGENT, ENDPOINT_ENV,
};
pub use download::{DirectoryDownloads, Download, DownloadTarget};
pub use error::{GatewayError, GatewayResult};
pub use gateway::{ExportGateway, PendingSubmission, PredictionView};
