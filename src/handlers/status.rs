use crate::{errors::ServiceError, AppState};
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use utoipa::ToSchema;

/// Tracks application start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call this on application startup)
pub fn init_start_time() {
    let _ = START_TIME.get_or_init(Instant::now);
}

fn get_uptime_secs() -> u64 {
    START_TIME.get().map(|t| t.elapsed().as_secs()).unwrap_or(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub categories: usize,
    pub products: usize,
}

/// Diagnostic view of the running backend
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    /// `database` or `memory`
    pub backend: String,
    pub counts: StatusCounts,
    pub environment: String,
    pub guest_quotes: bool,
    pub auth_enabled: bool,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is running", body = HealthResponse)),
    tag = "Status"
)]
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "up".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Backend kind and catalog counts. Storage failures surface as a generic 500.
#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Backend status", body = StatusResponse),
        (status = 500, description = "Storage unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "Status"
)]
pub async fn status(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.storage.get_categories().await?.len();
    let products = state.storage.get_products(&Default::default()).await?.len();

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
        backend: state.storage.kind().to_string(),
        counts: StatusCounts {
            categories,
            products,
        },
        environment: state.config.environment.clone(),
        guest_quotes: state.config.allow_guest_quotes,
        auth_enabled: state.tokens.is_enabled(),
    }))
}
