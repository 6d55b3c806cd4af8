//! Error types for Station Pulse.
//!
//! Every failure that crosses the API boundary is classified into one of
//! five kinds (see [`ErrorKind`]). The classification is what callers act
//! on: the cache stores it as the entry's last error, the session layer
//! turns it into a user-facing notice, and the polling scheduler uses
//! [`DashboardError::is_transient`] to decide how hard to back off.
//!
//! # Example
//!
//! ```
//! use pulse_core::{DashboardError, ErrorKind};
//!
//! let error = DashboardError::from_status(404, "station not found");
//! assert_eq!(error.kind(), ErrorKind::NotFound);
//! assert!(!error.is_transient());
//! ```

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport-level failure (connection refused, timeout, DNS).
    Network,
    /// The backend rejected the credentials (401/403).
    Auth,
    /// Malformed input, caught before a request was issued or rejected as such.
    Validation,
    /// The requested entity does not exist.
    NotFound,
    /// Anything else.
    Unknown,
}

impl ErrorKind {
    /// Returns the kind as a static label, used for metrics and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for Station Pulse operations.
///
/// The type is `Clone` because the same failure is handed to every caller
/// that was waiting on a coalesced request, and is kept as the cache
/// entry's last error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// Transport failure.
    #[error("network error: {message}")]
    Network {
        /// Description of the transport failure
        message: String,
    },

    /// Authentication or authorization failure.
    #[error("authentication failed: {message}")]
    Auth {
        /// HTTP status that triggered the failure, if any
        status: Option<u16>,
        /// Description of the failure
        message: String,
    },

    /// Invalid input.
    #[error("validation error for field '{field}': {message}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Entity not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was requested
        resource: String,
    },

    /// Unclassified failure.
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl DashboardError {
    // ============================================
    // Convenience constructors
    // ============================================

    /// Creates a Network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an Auth error not tied to an HTTP status.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a Validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a NotFound error.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Creates an Unknown error.
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::Auth {
                status: Some(status),
                message,
            },
            404 => Self::NotFound { resource: message },
            400 | 422 => Self::Validation {
                field: "request".to_string(),
                message,
            },
            _ => Self::Unknown(format!("HTTP {}: {}", status, message)),
        }
    }

    // ============================================
    // Query methods
    // ============================================

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } => ErrorKind::Network,
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Returns true if this error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(format!("invalid response body: {}", err))
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return Self::network(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return Self::Unknown(format!("invalid response body: {}", err));
        }
        Self::Unknown(err.to_string())
    }
}

/// Type alias for Results with DashboardError.
pub type Result<T> = std::result::Result<T, DashboardError>;
