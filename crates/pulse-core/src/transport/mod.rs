//! API transport abstraction.
//!
//! Every remote service the dashboard talks to (statistics, station
//! metadata, users) is reached through [`ApiTransport`]. Fetch adapters
//! build an [`ApiRequest`], hand it to the transport and decode the JSON
//! that comes back.

mod http;
mod request;

pub use http::{HttpTransport, HttpTransportConfig};
pub use request::{ApiRequest, Method};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::DashboardError;

/// A way of sending requests to the backend.
///
/// # Implementors
///
/// - `HttpTransport` - sends requests over HTTP with `reqwest`
/// - test doubles that answer from canned JSON and count calls
///
/// # Example
///
/// ```ignore
/// use pulse_core::{ApiRequest, ApiTransport};
///
/// struct Canned;
///
/// #[async_trait]
/// impl ApiTransport for Canned {
///     async fn send(&self, request: &ApiRequest) -> Result<Value, DashboardError> {
///         Ok(serde_json::json!({ "success": true, "results": [] }))
///     }
///
///     fn name(&self) -> &str {
///         "canned"
///     }
/// }
/// ```
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Sends a request and returns the decoded JSON body.
    ///
    /// An empty body is returned as `Value::Null`.
    ///
    /// # Errors
    ///
    /// - `DashboardError::Network` if the backend could not be reached
    /// - `DashboardError::Auth` for 401/403 responses
    /// - `DashboardError::NotFound` for 404 responses
    /// - `DashboardError::Unknown` for other failures or undecodable bodies
    async fn send(&self, request: &ApiRequest) -> Result<Value, DashboardError>;

    /// Returns the name of this transport, for logging.
    fn name(&self) -> &str;

    /// Performs a health check against the backend.
    ///
    /// The default implementation assumes the backend is healthy.
    async fn health_check(&self) -> Result<(), DashboardError> {
        Ok(())
    }
}
