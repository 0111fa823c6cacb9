//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response with submission counters
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub submissions: u64,
    pub rate_limited: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let meter = state.service.meter();
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "jokes-submit".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        submissions: meter.submissions(),
        rate_limited: meter.rate_limited(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
