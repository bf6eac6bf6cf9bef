//! The remote classifier seam and its HTTP implementation.

use async_trait::async_trait;
use digit_renderer::ExportedImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// Body posted to the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// `data:image/png;base64,...` rendering of the drawing.
    pub image: String,
}

impl PredictionRequest {
    /// Build a request carrying `image` as a data URL.
    #[must_use]
    pub fn from_image(image: &ExportedImage) -> Self {
        Self {
            image: image.to_data_url(),
        }
    }
}

/// Something that turns an image into a label.
///
/// Futures are not `Send` so implementations can run on the browser event
/// loop.
#[async_trait(?Send)]
pub trait Classifier {
    /// Classify the image in `request`, returning the label.
    async fn classify(&self, request: &PredictionRequest) -> GatewayResult<String>;
}

/// An absent classifier fails every request with
/// [`GatewayError::MissingEndpoint`], so hosts without an endpoint can still
/// save locally.
#[async_trait(?Send)]
impl<C: Classifier> Classifier for Option<C> {
    async fn classify(&self, request: &PredictionRequest) -> GatewayResult<String> {
        match self {
            Some(classifier) => classifier.classify(request).await,
            None => Err(GatewayError::MissingEndpoint),
        }
    }
}

/// Classifier reached over HTTP: `POST <endpoint>` with a JSON body.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: Client,
    endpoint: Url,
}

impl HttpClassifier {
    /// Create a classifier for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: Url, user_agent: &str) -> GatewayResult<Self> {
        Ok(Self {
            http: build_client(user_agent)?,
            endpoint,
        })
    }

    /// Create a classifier from gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingEndpoint`] if no endpoint is configured.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::new(config.require_endpoint()?.clone(), &config.user_agent)
    }

    /// The endpoint requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn build_client(user_agent: &str) -> GatewayResult<Client> {
    Ok(Client::builder()
        .user_agent(user_agent)
        // Disable proxy detection to avoid macOS system-configuration panic
        .no_proxy()
        .build()?)
}

#[cfg(target_arch = "wasm32")]
fn build_client(_user_agent: &str) -> GatewayResult<Client> {
    // The browser owns the user agent.
    Ok(Client::builder().build()?)
}

#[async_trait(?Send)]
impl Classifier for HttpClassifier {
    async fn classify(&self, request: &PredictionRequest) -> GatewayResult<String> {
        tracing::debug!(endpoint = %self.endpoint, size = request.image.len(), "Submitting drawing");

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(label_from_body(&body))
    }
}

/// Interpret a classifier response body as a label.
///
/// A JSON string yields its contents, a JSON number or boolean its text;
/// anything else is taken verbatim.
#[must_use]
pub fn label_from_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::String(label)) => label,
        Ok(Value::Number(number)) => number.to_string(),
        Ok(Value::Bool(flag)) => flag.to_string(),
        _ => body.to_string(),
    }
}
