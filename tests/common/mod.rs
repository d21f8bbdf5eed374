#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use ayak_api::{
    build_router,
    config::AppConfig,
    db::{self, DbConfig},
    storage::{DatabaseStorage, MemoryStorage, Storage},
    AppState,
};

pub const TEST_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";
pub const TEST_USER: &str = "user-1";

/// Which storage implementation a test app runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

pub async fn memory_storage() -> Arc<dyn Storage> {
    Arc::new(MemoryStorage::new())
}

/// Fresh migrated SQLite in-memory database. One connection, so every query
/// sees the same database.
pub async fn sqlite_storage() -> Arc<dyn Storage> {
    let pool = db::establish_connection_with_config(&DbConfig::single_connection("sqlite::memory:"))
        .await
        .expect("failed to open sqlite database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    Arc::new(DatabaseStorage::new(Arc::new(pool)))
}

pub async fn storage_for(backend: Backend) -> Arc<dyn Storage> {
    match backend {
        Backend::Memory => memory_storage().await,
        Backend::Sqlite => sqlite_storage().await,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        jwt_secret: Some(TEST_SECRET.to_string()),
        seed_on_startup: false,
        ..AppConfig::default()
    }
}

/// Router plus state over a fresh backend, driven with `oneshot`.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_backend(Backend::Memory).await
    }

    pub async fn with_backend(backend: Backend) -> Self {
        Self::with_config(backend, test_config()).await
    }

    pub async fn with_config(backend: Backend, config: AppConfig) -> Self {
        let storage = storage_for(backend).await;
        let state = AppState::new(storage, config);
        let token = state
            .tokens
            .issue(TEST_USER, Some("Test User"), Some("test@example.com"))
            .unwrap_or_default();
        let router = build_router(state.clone());
        Self {
            router,
            state,
            token,
        }
    }

    pub fn storage(&self) -> &dyn Storage {
        self.state.storage.as_ref()
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn token_for(&self, user_id: &str) -> String {
        self.state
            .tokens
            .issue(user_id, None, None)
            .expect("failed to issue token")
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let raw = body.map(|json| serde_json::to_string(&json).expect("serialize body"));
        self.request_raw(method, uri, raw.as_deref(), token).await
    }

    /// Like [`TestApp::request`] but with an unparsed body, for malformed JSON.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }
        let body = match body {
            Some(raw) => {
                builder = builder.header("content-type", "application/json");
                Body::from(raw.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> Response {
        self.request(method, uri, body, Some(self.token())).await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
