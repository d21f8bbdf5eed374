//! Ayak API Library
//!
//! Catalog, quote-request and inquiry backend for Ayak workspace furniture,
//! plus the client-side quote cart that feeds it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cart;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod seed;
pub mod storage;

use axum::{
    extract::FromRef,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

use crate::{auth::TokenService, config::AppConfig, storage::Storage};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: AppConfig) -> Self {
        let tokens = Arc::new(TokenService::new(auth::AuthConfig::from_app_config(&config)));
        Self {
            storage,
            config: Arc::new(config),
            tokens,
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// All `/api` routes, without middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/api/products/:id", get(handlers::products::get_product))
        .route("/api/categories", get(handlers::categories::list_categories))
        .route(
            "/api/categories/:slug",
            get(handlers::categories::get_category),
        )
        .route(
            "/api/quotes",
            get(handlers::quotes::list_quotes).post(handlers::quotes::create_quote),
        )
        .route("/api/quotes/:id", get(handlers::quotes::get_quote))
        .route("/api/inquiries", post(handlers::inquiries::create_inquiry))
        .route("/api/auth/user", get(handlers::auth::current_user))
        .route("/api/status", get(handlers::status::status))
        .route("/api/health", get(handlers::status::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
}

/// The full application: routes, request ids, logging, tracing and
/// compression. CORS is layered on by the binary since it depends on
/// deployment settings.
pub fn build_router(state: AppState) -> Router {
    errors::set_expose_error_details(state.config.expose_error_details);

    api_routes()
        .layer(middleware::http_trace_layer())
        .layer(CompressionLayer::new())
        .layer(axum::middleware::from_fn(
            middleware::request_logging_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .with_state(state)
}
