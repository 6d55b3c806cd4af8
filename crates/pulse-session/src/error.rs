//! Error type of the session layer.

use pulse_core::{DashboardError, ErrorKind};
use thiserror::Error;

/// Failure of a session operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The backend call failed or rejected the credentials.
    #[error(transparent)]
    Api(#[from] DashboardError),

    /// The persisted token could not be read or written.
    #[error("token storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// The operation needs a signed-in user.
    #[error("no active session")]
    NotAuthenticated,
}

impl SessionError {
    /// Creates a Storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an Api error for rejected credentials.
    pub fn invalid_credentials() -> Self {
        Self::Api(DashboardError::auth("invalid email or password"))
    }

    /// Returns the classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(e) => e.kind(),
            Self::Storage { .. } => ErrorKind::Unknown,
            Self::NotAuthenticated => ErrorKind::Auth,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_transient())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("invalid token file: {}", err))
    }
}
