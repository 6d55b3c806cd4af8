use serde::{Deserialize, Serialize};

/// Reported state of a backend service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Unhealthy,
}

/// Response of the backend's `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: ServiceStatus,
    /// `connected` or `disconnected`.
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub timestamp: String,
}
