//! Gateway configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{GatewayError, GatewayResult};

/// File name local saves are delivered under.
pub const DEFAULT_DOWNLOAD_NAME: &str = "drawing.png";

/// Environment variable holding the classifier URL.
pub const ENDPOINT_ENV: &str = "CLASSIFIER_ENDPOINT";

/// User agent sent with classifier requests.
pub const DEFAULT_USER_AGENT: &str = concat!("digit-canvas/", env!("CARGO_PKG_VERSION"));

/// What a failed submission does to the published prediction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log only; the view shows nothing.
    #[default]
    Swallow,
    /// Also raise [`PredictionView::failed`](crate::PredictionView::failed)
    /// until the next success.
    Surface,
}

/// Configuration for an [`ExportGateway`](crate::ExportGateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Classifier endpoint.
    pub endpoint: Option<Url>,
    /// Name local saves are delivered under.
    pub download_name: String,
    /// Failure visibility.
    pub failure_policy: FailurePolicy,
    /// User agent for classifier requests.
    pub user_agent: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            download_name: DEFAULT_DOWNLOAD_NAME.to_string(),
            failure_policy: FailurePolicy::Swallow,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl GatewayConfig {
    /// Set the classifier endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if `endpoint` does not parse.
    pub fn with_endpoint(mut self, endpoint: &str) -> GatewayResult<Self> {
        self.endpoint = Some(parse_endpoint(endpoint)?);
        Ok(self)
    }

    /// Set the failure policy.
    #[must_use]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Build a configuration from the environment.
    ///
    /// Environment variables:
    /// - `CLASSIFIER_ENDPOINT`: classifier URL (default: none)
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] if the variable is set but does not
    /// parse.
    pub fn from_env() -> GatewayResult<Self> {
        match std::env::var(ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => {
                Self::default().with_endpoint(endpoint.trim())
            }
            _ => Ok(Self::default()),
        }
    }

    /// The endpoint, or [`GatewayError::MissingEndpoint`].
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint is configured.
    pub fn require_endpoint(&self) -> GatewayResult<&Url> {
        self.endpoint.as_ref().ok_or(GatewayError::MissingEndpoint)
    }
}

fn parse_endpoint(endpoint: &str) -> GatewayResult<Url> {
    let url = Url::parse(endpoint).map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GatewayError::InvalidUrl(format!(
            "unsupported scheme '{other}'"
        ))),
    }
}
