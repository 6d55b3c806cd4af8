//! Axum server answering canned JSON per method and path.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{Value, json};

/// A request the backend received.
#[derive(Debug, Clone)]
pub struct Hit {
    pub method: Method,
    pub path: String,
    pub query: String,
}

#[derive(Default)]
struct Routes {
    responses: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
    hits: Mutex<Vec<Hit>>,
}

/// Running fake backend. Unknown routes answer 404.
pub struct FakeBackend {
    addr: SocketAddr,
    routes: Arc<Routes>,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let routes = Arc::new(Routes::default());
        let app = Router::new()
            .fallback(answer)
            .with_state(routes.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, routes }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn get(&self, path: &str, body: Value) {
        self.respond(Method::GET, path, StatusCode::OK, body);
    }

    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.routes
            .responses
            .lock()
            .unwrap()
            .insert((method, path.to_string()), (status, body));
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.routes.hits.lock().unwrap().clone()
    }

    /// Requests received for `path`, any method.
    pub fn hits_for(&self, path: &str) -> Vec<Hit> {
        self.hits().into_iter().filter(|h| h.path == path).collect()
    }

    pub fn count(&self, path: &str) -> usize {
        self.hits_for(path).len()
    }
}

async fn answer(State(routes): State<Arc<Routes>>, method: Method, uri: Uri) -> Response {
    let path = uri.path().to_string();
    routes.hits.lock().unwrap().push(Hit {
        method: method.clone(),
        path: path.clone(),
        query: uri.query().unwrap_or_default().to_string(),
    });

    let response = routes
        .responses
        .lock()
        .unwrap()
        .get(&(method, path.clone()))
        .cloned();
    match response {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": format!("no route for {}", path) })),
        )
            .into_response(),
    }
}
