//! Pulse Session - Sign-in, token persistence and the users API
//!
//! [`SessionManager`] owns the one active session of the process. It signs
//! users in against the users API, persists the session token through a
//! [`TokenStore`] and reports every outcome to a [`Notifier`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pulse_core::{HttpTransport, HttpTransportConfig};
//! use pulse_session::{AuthConfig, LogNotifier, MemoryTokenStore, SessionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = HttpTransport::new(HttpTransportConfig::new("http://localhost:8000"))?;
//! let session = SessionManager::new(
//!     Arc::new(transport),
//!     Arc::new(MemoryTokenStore::new()),
//!     Arc::new(LogNotifier),
//!     AuthConfig::default(),
//! );
//!
//! session.restore().await;
//! if !session.is_authenticated() {
//!     session.login("operator@plant.com", "secret").await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod notice;
pub mod session;
pub mod token;
pub mod users;

pub use error::SessionError;
pub use notice::{LogNotifier, Notice, NoticeKind, NoticeLevel, Notifier};
pub use session::{AuthConfig, Registration, Session, SessionManager, SessionState};
pub use token::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore};
pub use users::{Role, User, UserCreate, UserFilters, UserPayload, UserUpdate, UsersService};
