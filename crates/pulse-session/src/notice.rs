//! User-facing notices of session outcomes.
//!
//! Notices carry a stable [`NoticeKind`] code and a fixed message, never
//! raw transport text. The underlying error is logged where it happens.

use pulse_core::ErrorKind;
use serde::Serialize;
use tracing::{info, warn};

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    LoginSucceeded,
    /// Credentials were rejected.
    LoginFailed,
    /// The login could not be carried out.
    LoginError,
    RegisterSucceeded,
    RegisterFailed,
    RegisterError,
    LoggedOut,
    AccountDeleted,
    DeleteFailed,
    DeleteError,
}

impl NoticeKind {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Self::LoginSucceeded | Self::RegisterSucceeded | Self::LoggedOut | Self::AccountDeleted => {
                NoticeLevel::Info
            },
            _ => NoticeLevel::Error,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::LoginSucceeded => "Signed in.",
            Self::LoginFailed => "The email or password is incorrect.",
            Self::LoginError => "Sign-in could not be completed.",
            Self::RegisterSucceeded => "Account created.",
            Self::RegisterFailed => "The account could not be created.",
            Self::RegisterError => "Registration could not be completed.",
            Self::LoggedOut => "Signed out.",
            Self::AccountDeleted => "Account deleted.",
            Self::DeleteFailed => "The account could not be deleted.",
            Self::DeleteError => "Account deletion could not be completed.",
        }
    }
}

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A notice for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub level: NoticeLevel,
    pub message: String,
    /// Classification of the failure behind an error notice.
    pub error_kind: Option<ErrorKind>,
}

impl Notice {
    pub fn new(kind: NoticeKind) -> Self {
        Self {
            kind,
            level: kind.level(),
            message: kind.message().to_string(),
            error_kind: None,
        }
    }

    pub fn failure(kind: NoticeKind, error_kind: ErrorKind) -> Self {
        Self {
            error_kind: Some(error_kind),
            ..Self::new(kind)
        }
    }

    /// Overrides the default message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Receiver of session notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info => info!(kind = ?notice.kind, "{}", notice.message),
            NoticeLevel::Error => warn!(
                kind = ?notice.kind,
                error_kind = ?notice.error_kind,
                "{}",
                notice.message
            ),
        }
    }
}
