//! Joke submission endpoint
//!
//! `POST /submit` (or `PUT`) with the joke as a JSON body.
//!
//! Query parameters:
//! - `format=json|xml|yaml` selects the response format (default json)
//! - `dry-run` (or `dryrun`) validates without storing anything

use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use jokes_common::OutputFormat;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;

use crate::submission::{EncodedResponse, SubmissionRequest};
use crate::AppState;

/// POST|PUT /submit
pub async fn submit_joke(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> EncodedResponse {
    let fingerprint = requester_fingerprint(
        &headers,
        connect_info.map(|ConnectInfo(addr)| addr),
        state.trust_proxy,
    );
    let format = OutputFormat::from_param(params.get("format").map(String::as_str));
    let dry_run = params.contains_key("dry-run") || params.contains_key("dryrun");
    let analytics = analytics_context(&fingerprint, &uri, &params);

    state
        .service
        .handle(SubmissionRequest {
            body: body.to_vec(),
            format,
            fingerprint,
            analytics,
            dry_run,
        })
        .await
}

impl IntoResponse for EncodedResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, self.content_type)],
            self.body,
        )
            .into_response()
    }
}

/// Peer address, or the first `X-Forwarded-For` hop behind a trusted proxy
fn requester_fingerprint(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy: bool,
) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(addr) = forwarded {
            return addr.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn analytics_context(
    fingerprint: &str,
    uri: &Uri,
    params: &HashMap<String, String>,
) -> Map<String, Value> {
    let path: Vec<&str> = uri.path().split('/').filter(|s| !s.is_empty()).collect();

    let mut context = Map::new();
    context.insert("ipAddress".to_string(), json!(fingerprint));
    context.insert("urlPath".to_string(), json!(path));
    context.insert("urlParameters".to_string(), json!(params));
    context
}

/// Build submission routes
pub fn submit_routes() -> Router<AppState> {
    Router::new().route("/submit", post(submit_joke).put(submit_joke))
}
