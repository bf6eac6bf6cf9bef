//! The export gateway.
//!
//! ```text
//!                      ┌──▶ DownloadTarget ("drawing.png")
//! SurfaceBuffer ──PNG──┤
//!                      └──▶ Classifier ──▶ PredictionView { label, loading, failed }
//!                                               │
//!                                               └──▶ watch subscribers
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use digit_core::SurfaceBuffer;
use digit_renderer::{ExportFormat, ExportedImage, SurfaceExporter};
use tokio::sync::watch;

use crate::classifier::{Classifier, PredictionRequest};
use crate::config::{FailurePolicy, GatewayConfig};
use crate::download::{Download, DownloadTarget};
use crate::error::GatewayResult;

/// What the presentation layer shows about predictions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionView {
    /// Last label received; empty until the first success.
    pub label: String,
    /// Whether a submission is in flight.
    pub loading: bool,
    /// Whether the last submission failed (only under
    /// [`FailurePolicy::Surface`]).
    pub failed: bool,
}

/// Prediction state shared with outstanding submissions.
struct Shared {
    view: watch::Sender<PredictionView>,
    in_flight: AtomicUsize,
}

/// Packages the surface for local download or classifier submission.
pub struct ExportGateway<C> {
    classifier: C,
    config: GatewayConfig,
    exporter: SurfaceExporter,
    shared: Arc<Shared>,
}

impl<C: Classifier> ExportGateway<C> {
    /// Create a gateway with an empty prediction.
    #[must_use]
    pub fn new(classifier: C, config: GatewayConfig) -> Self {
        let (view, _) = watch::channel(PredictionView::default());
        Self {
            classifier,
            config,
            exporter: SurfaceExporter::with_defaults(),
            shared: Arc::new(Shared {
                view,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// The gateway configuration.
    #[must_use]
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The classifier submissions go to.
    #[must_use]
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Subscribe to prediction updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PredictionView> {
        self.shared.view.subscribe()
    }

    /// Snapshot of the current prediction.
    #[must_use]
    pub fn view(&self) -> PredictionView {
        self.shared.view.borrow().clone()
    }

    /// Encode the surface as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode(&self, surface: &SurfaceBuffer) -> GatewayResult<ExportedImage> {
        Ok(self.exporter.export(surface, ExportFormat::Png)?)
    }

    /// Serialize the surface to PNG and deliver it under the configured name.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or delivery fails.
    pub fn save_locally(
        &self,
        surface: &SurfaceBuffer,
        target: &dyn DownloadTarget,
    ) -> GatewayResult<()> {
        let download = Download {
            file_name: self.config.download_name.clone(),
            image: self.encode(surface)?,
        };
        target.deliver(&download)
    }

    /// Serialize the surface and submit it for classification.
    ///
    /// On success the label is published and returned. On failure the label
    /// is left as it was and the error is logged and returned. `loading` is
    /// cleared on every exit path.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding, transport or the classifier fails.
    pub async fn submit_for_prediction(&self, surface: &SurfaceBuffer) -> GatewayResult<String> {
        let image = self.encode(surface)?;
        self.submit_image(&image).await
    }

    /// Submit an already encoded image for classification.
    ///
    /// # Errors
    ///
    /// Returns an error if transport or the classifier fails.
    pub async fn submit_image(&self, image: &ExportedImage) -> GatewayResult<String> {
        let pending = self.begin_submission();
        self.complete_submission(pending, image).await
    }

    /// Raise `loading` now, ahead of the request itself.
    ///
    /// Hosts that hand the request to an executor call this first so the
    /// loading state is visible before the task is polled.
    pub fn begin_submission(&self) -> PendingSubmission {
        PendingSubmission::begin(&self.shared)
    }

    /// Send `image` to the classifier on behalf of `pending`.
    ///
    /// # Errors
    ///
    /// Returns an error if transport or the classifier fails.
    pub async fn complete_submission(
        &self,
        pending: PendingSubmission,
        image: &ExportedImage,
    ) -> GatewayResult<String> {
        let _pending = pending;
        let request = PredictionRequest::from_image(image);

        match self.classifier.classify(&request).await {
            Ok(label) => {
                tracing::info!(label = %label, "Prediction received");
                self.shared.view.send_modify(|view| {
                    view.label.clone_from(&label);
                    view.failed = false;
                });
                Ok(label)
            }
            Err(err) => {
                tracing::error!(error = %err, "Prediction failed");
                if self.config.failure_policy == FailurePolicy::Surface {
                    self.shared.view.send_modify(|view| view.failed = true);
                }
                Err(err)
            }
        }
    }
}

/// A submission that has started but not finished.
///
/// `loading` stays true until the last outstanding submission is dropped.
#[must_use = "loading is cleared as soon as the submission is dropped"]
pub struct PendingSubmission {
    shared: Arc<Shared>,
}

impl PendingSubmission {
    fn begin(shared: &Arc<Shared>) -> Self {
        shared.in_flight.fetch_add(1, Ordering::SeqCst);
        shared.view.send_modify(|view| view.loading = true);
        Self {
            shared: Arc::clone(shared),
        }
    }
}

impl Drop for PendingSubmission {
    fn drop(&mut self) {
        let remaining = self.shared.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            self.shared.view.send_modify(|view| view.loading = false);
        }
    }
}
