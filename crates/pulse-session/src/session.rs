//! The process-wide session and its state machine.
//!
//! ```text
//! Unauthenticated ──login──▶ Authenticating ──ok──▶ Authenticated
//!        ▲                         │                      │
//!        └───────── failure ───────┘◀── logout / delete ──┘
//! ```
//!
//! The token is `token-<user id>` and is persisted through a [`TokenStore`]
//! so [`SessionManager::restore`] can bring the session back on startup.

use std::sync::Arc;

use parking_lot::RwLock;
use pulse_core::{ApiTransport, DashboardError, ErrorKind};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::notice::{Notice, NoticeKind, Notifier};
use crate::token::TokenStore;
use crate::users::{Role, User, UserCreate, UserFilters, UsersService};

const TOKEN_PREFIX: &str = "token-";
const DEFAULT_AFFILIATION: &str = "User";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// The signed-in user and their token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    fn for_user(user: User) -> Self {
        let token = format!("{}{}", TOKEN_PREFIX, user.id);
        Self { user, token }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Account allowed to sign in with any non-empty password.
    ///
    /// For development backends only. Unset in every other deployment.
    pub dev_admin_email: Option<String>,
}

/// Input of a self-registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    /// Defaults to `"User"`.
    #[serde(default)]
    pub affiliation: Option<String>,
}

impl Registration {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            affiliation: None,
        }
    }

    fn into_user_create(self) -> UserCreate {
        UserCreate {
            email: self.email,
            password: self.password,
            name: self.name,
            role: Role::User,
            affiliation: self
                .affiliation
                .unwrap_or_else(|| DEFAULT_AFFILIATION.to_string()),
        }
    }
}

/// Owner of the single active session.
pub struct SessionManager {
    users: UsersService,
    store: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
    config: AuthConfig,
    state: watch::Sender<SessionState>,
    session: RwLock<Option<Session>>,
}

impl SessionManager {
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        store: Arc<dyn TokenStore>,
        notifier: Arc<dyn Notifier>,
        config: AuthConfig,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            users: UsersService::new(transport),
            store,
            notifier,
            config,
            state,
            session: RwLock::new(None),
        }
    }

    /// The users API client this manager talks to.
    pub fn users(&self) -> &UsersService {
        &self.users
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state transition.
    pub fn state_changes(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Restores the session from the persisted token.
    ///
    /// Any failure forgets the token and leaves the session signed out;
    /// nothing is reported to the user. Returns the restored user.
    pub async fn restore(&self) -> Option<User> {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session token");
                return None;
            },
        };

        self.set_state(SessionState::Authenticating);
        let id = token.strip_prefix(TOKEN_PREFIX).unwrap_or(&token);
        match self.users.get_by_id(id).await {
            Ok(Some(user)) => {
                info!(user_id = %user.id, "Session restored");
                self.begin(Session {
                    user: user.clone(),
                    token,
                });
                Some(user)
            },
            Ok(None) => {
                debug!(user_id = %id, "Persisted token refers to an unknown user");
                self.discard_token();
                None
            },
            Err(e) => {
                warn!(error = %e, "Failed to restore session");
                self.discard_token();
                None
            },
        }
    }

    /// Signs in with email and password.
    ///
    /// Blank credentials are rejected before any request is made.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let field = if email.is_empty() { "email" } else { "password" };
            let err = DashboardError::validation(field, "email and password are required");
            self.notify_failure(NoticeKind::LoginFailed, ErrorKind::Validation);
            return Err(err.into());
        }

        self.set_state(SessionState::Authenticating);
        match self.authenticate(email, password).await {
            Ok(user) => {
                info!(user_id = %user.id, role = user.role.as_str(), "Signed in");
                self.begin(Session::for_user(user.clone()));
                let notice = Notice::new(NoticeKind::LoginSucceeded);
                self.notifier.notify(if user.is_admin() {
                    notice.with_message("Signed in as administrator.")
                } else {
                    notice
                });
                Ok(user)
            },
            Err(e) => {
                warn!(error = %e, "Sign-in failed");
                self.end();
                let kind = match e.kind() {
                    ErrorKind::Auth => NoticeKind::LoginFailed,
                    _ => NoticeKind::LoginError,
                };
                self.notify_failure(kind, e.kind());
                Err(e)
            },
        }
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let listed = self
            .users
            .list(&UserFilters::by_email(email))
            .await?
            .into_iter()
            .next()
            .ok_or_else(SessionError::invalid_credentials)?;

        let user = self
            .users
            .get_by_id(&listed.id)
            .await?
            .ok_or_else(SessionError::invalid_credentials)?;

        if self.is_dev_admin(email) {
            warn!(email, "Password check skipped for development admin");
            return Ok(user);
        }

        match listed.password.as_deref() {
            Some(expected) if expected == password => Ok(user),
            _ => Err(SessionError::invalid_credentials()),
        }
    }

    fn is_dev_admin(&self, email: &str) -> bool {
        self.config
            .dev_admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email))
    }

    /// Creates a regular user account. Does not sign in.
    pub async fn register(&self, registration: Registration) -> Result<User, SessionError> {
        let create = registration.into_user_create();
        match self.users.create(&create).await {
            Ok(user) => {
                info!(user_id = %user.id, "User registered");
                self.notifier.notify(Notice::new(NoticeKind::RegisterSucceeded));
                Ok(user)
            },
            Err(e) => {
                warn!(error = %e, "Registration failed");
                let kind = match e.kind() {
                    ErrorKind::Network | ErrorKind::Unknown => NoticeKind::RegisterError,
                    _ => NoticeKind::RegisterFailed,
                };
                self.notify_failure(kind, e.kind());
                Err(e.into())
            },
        }
    }

    /// Ends the session and forgets the persisted token.
    pub fn logout(&self) {
        let user_id = self.current_user().map(|u| u.id);
        self.discard_token();
        info!(user_id = ?user_id, "Signed out");
        self.notifier.notify(Notice::new(NoticeKind::LoggedOut));
    }

    /// Deletes the signed-in user's account and ends the session.
    ///
    /// Returns `Ok(false)` when the API declines the deletion.
    ///
    /// # Errors
    ///
    /// `SessionError::NotAuthenticated` without a request when nobody is
    /// signed in, or the API error of a failed request.
    pub async fn delete_account(&self) -> Result<bool, SessionError> {
        let Some(user) = self.current_user() else {
            return Err(SessionError::NotAuthenticated);
        };

        match self.users.delete(&user.id).await {
            Ok(true) => {
                info!(user_id = %user.id, "Account deleted");
                self.discard_token();
                self.notifier.notify(Notice::new(NoticeKind::AccountDeleted));
                Ok(true)
            },
            Ok(false) => {
                warn!(user_id = %user.id, "Account deletion declined");
                self.notifier.notify(Notice::new(NoticeKind::DeleteFailed));
                Ok(false)
            },
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Account deletion failed");
                self.notify_failure(NoticeKind::DeleteError, e.kind());
                Err(e.into())
            },
        }
    }

    fn begin(&self, session: Session) {
        if let Err(e) = self.store.save(&session.token) {
            warn!(error = %e, "Failed to persist session token");
        }
        *self.session.write() = Some(session);
        self.set_state(SessionState::Authenticated);
    }

    fn end(&self) {
        *self.session.write() = None;
        self.set_state(SessionState::Unauthenticated);
    }

    fn discard_token(&self) {
        self.end();
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear session token");
        }
    }

    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            debug!(from = ?*state, to = ?next, "Session state changed");
            *state = next;
            true
        });
    }

    fn notify_failure(&self, kind: NoticeKind, error_kind: ErrorKind) {
        self.notifier.notify(Notice::failure(kind, error_kind));
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("user", &self.current_user().map(|u| u.id))
            .finish_non_exhaustive()
    }
}
