//! jokes-submit library - joke submission service
//!
//! Accepts user-submitted jokes, validates them against the joke schema,
//! stores each accepted submission as its own JSON file and answers in
//! JSON, XML or YAML.

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod i18n;
pub mod submission;
pub mod telemetry;

use crate::config::SubmissionConfig;
use crate::submission::SubmissionService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: SubmissionService,
    /// Take the requester address from `X-Forwarded-For`
    pub trust_proxy: bool,
    /// Request body limit in bytes
    pub max_body_bytes: usize,
}

impl AppState {
    /// Create new application state
    pub fn new(service: SubmissionService, trust_proxy: bool, max_body_bytes: usize) -> Self {
        Self {
            service,
            trust_proxy,
            max_body_bytes,
        }
    }

    /// State with the built-in collaborators for `config`
    pub fn from_config(config: Arc<SubmissionConfig>, trust_proxy: bool, max_body_bytes: usize) -> Self {
        Self::new(SubmissionService::new(config), trust_proxy, max_body_bytes)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .merge(api::submit_routes().layer(body_limit))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
