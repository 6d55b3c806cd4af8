//! Shared helpers for pulse-session integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_core::{ApiRequest, ApiTransport, DashboardError, Method};
use pulse_session::{
    AuthConfig, MemoryTokenStore, Notice, NoticeKind, Notifier, SessionManager, TokenStore,
};
use serde_json::{Value, json};

pub const USERS: &str = "/api/v1/users";

/// Users API double answering from canned responses keyed by method and path.
#[derive(Default)]
pub struct UsersBackend {
    responses: Mutex<HashMap<(Method, String), Result<Value, DashboardError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl UsersBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.responses
            .lock()
            .insert((method, path.to_string()), Ok(body));
    }

    pub fn fail(&self, method: Method, path: &str, error: DashboardError) {
        self.responses
            .lock()
            .insert((method, path.to_string()), Err(error));
    }

    /// Registers `user` under both the email lookup and its id.
    pub fn with_user(&self, id: u64, email: &str, password: &str, role: &str) {
        self.respond(
            Method::Get,
            USERS,
            json!({ "data": [{
                "id": id, "email": email, "name": "Listed", "role": role, "password": password
            }] }),
        );
        self.respond(
            Method::Get,
            &format!("{}/{}", USERS, id),
            json!({ "id": id, "email": email, "name": "Full Record", "role": role, "is_active": true }),
        );
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ApiTransport for UsersBackend {
    async fn send(&self, request: &ApiRequest) -> Result<Value, DashboardError> {
        self.requests.lock().push(request.clone());
        let key = (request.method(), request.path().to_string());
        let response = self.responses.lock().get(&key).cloned();
        response.unwrap_or_else(|| Err(DashboardError::not_found(request.path())))
    }

    fn name(&self) -> &str {
        "users-backend"
    }
}

/// Notifier that keeps every notice.
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn kinds(&self) -> Vec<NoticeKind> {
        self.notices.lock().iter().map(|n| n.kind).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

pub struct Harness {
    pub backend: Arc<UsersBackend>,
    pub store: Arc<MemoryTokenStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub session: SessionManager,
}

pub fn harness(config: AuthConfig) -> Harness {
    harness_with_store(config, Arc::new(MemoryTokenStore::new()))
}

pub fn harness_with_store(config: AuthConfig, store: Arc<MemoryTokenStore>) -> Harness {
    let backend = UsersBackend::new();
    let notifier = RecordingNotifier::new();
    let session = SessionManager::new(
        backend.clone(),
        store.clone() as Arc<dyn TokenStore>,
        notifier.clone(),
        config,
    );
    Harness {
        backend,
        store,
        notifier,
        session,
    }
}

pub fn dev_admin() -> AuthConfig {
    AuthConfig {
        dev_admin_email: Some("admin@system.com".to_string()),
    }
}
