//! Error type of the monitor.

use pulse_core::DashboardError;
use thiserror::Error;

/// Failure while starting the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Configuration sources could not be read or merged.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// A configuration value is out of range.
    #[error("invalid configuration for '{field}': {message}")]
    InvalidConfig {
        /// Dotted path of the offending setting
        field: String,
        /// Description of the problem
        message: String,
    },

    /// The API transport could not be built.
    #[error(transparent)]
    Api(#[from] DashboardError),

    /// The Prometheus exporter could not be installed.
    #[error("metrics exporter error: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

impl MonitorError {
    /// Creates an InvalidConfig error.
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }
}
