//! Shared harness for the HTTP integration tests.
//!
//! Every test gets its own router over a fresh `InMemoryRecordStore` and a
//! fixed clock, with bcrypt turned down to its cheapest cost.

#![allow(clippy::expect_used)]
#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use eventmingle::auth::handlers::create_account;
use eventmingle::config::{AuthConfig, ChatConfig};
use eventmingle::server::{AppState, build_router, cors_layer};
use eventmingle_core::entities::{Role, User};
use eventmingle_testing::{FixedClock, InMemoryRecordStore, fixtures, init_test_tracing, test_clock};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Password used for every seeded account.
pub const PASSWORD: &str = "correct horse battery";

/// A router plus direct handles on its dependencies.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryRecordStore>,
    pub clock: Arc<FixedClock>,
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `message` field of a JSON error body.
    pub fn error_message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        init_test_tracing();
        let store = Arc::new(InMemoryRecordStore::new());
        let clock = Arc::new(test_clock());
        let auth = AuthConfig {
            bcrypt_cost: 4,
            ..AuthConfig::default()
        };
        let state = AppState::new(store.clone(), clock.clone(), &auth, &ChatConfig::default());
        let router = build_router(state.clone(), cors_layer(&[]));
        Self {
            router,
            state,
            store,
            clock,
        }
    }

    /// Send a request, optionally with a bearer token and JSON body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, token, None).await
    }

    /// Create an account with [`PASSWORD`] and return it with a fresh token.
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> (User, String) {
        let draft = eventmingle_core::entities::UserDraft {
            password: Some(PASSWORD.to_string()),
            ..fixtures::user_draft(name, email, role)
        };
        let user = create_account(&self.state, draft).await.expect("seed user");
        let token = self.state.tokens.issue(&user).expect("token");
        (user, token)
    }

    pub async fn admin(&self) -> (User, String) {
        self.seed_user("Ada Admin", "admin@eventmingle.test", Role::Admin).await
    }

    pub async fn manager(&self) -> (User, String) {
        self.seed_user("Max Manager", "manager@eventmingle.test", Role::EventManager)
            .await
    }

    pub async fn member(&self, name: &str, email: &str) -> (User, String) {
        self.seed_user(name, email, Role::User).await
    }
}

/// JSON for a valid event create payload.
pub fn event_json(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": "An evening of talks",
        "category": "tech",
        "location": "Community Hall, Lisbon",
        "start_time": "2025-02-01T18:00:00Z",
        "end_time": "2025-02-01T20:00:00Z",
        "status": "published"
    })
}
