//! HTTP transport built on `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ApiRequest, ApiTransport, Method};
use crate::error::DashboardError;
use crate::types::{HealthCheckResponse, ServiceStatus};

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the backend, e.g. `http://stats.local:8000`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Creates a configuration with the default 10 second timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Sends [`ApiRequest`]s over HTTP and classifies failures.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Creates a new transport.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Validation` if the base URL is empty and
    /// `DashboardError::Unknown` if the HTTP client cannot be built.
    pub fn new(config: HttpTransportConfig) -> Result<Self, DashboardError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DashboardError::validation(
                "api_base_url",
                "base URL cannot be empty",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DashboardError::unknown(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, DashboardError> {
        let method = match request.method() {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, self.url(request.path()));
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        debug!(request = %request, "Sending API request");
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = error_message(&bytes).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(DashboardError::from_status(status.as_u16(), message));
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn name(&self) -> &str {
        "http"
    }

    async fn health_check(&self) -> Result<(), DashboardError> {
        let body = self.send(&ApiRequest::get("/health")).await?;
        let health: HealthCheckResponse = serde_json::from_value(body)?;
        match health.status {
            ServiceStatus::Healthy => Ok(()),
            ServiceStatus::Unhealthy => Err(DashboardError::unknown(format!(
                "backend reports unhealthy (database {})",
                health.database
            ))),
        }
    }
}

/// Pulls a readable message out of an error body (`error`, `detail` or `message`).
fn error_message(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    ["error", "detail", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}
