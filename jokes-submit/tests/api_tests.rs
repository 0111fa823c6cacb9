//! Integration tests for jokes-submit API endpoints
//!
//! Tests cover:
//! - Health endpoint and submission counters
//! - POST/PUT /submit with JSON, XML and YAML responses
//! - Dry runs and rejection bodies
//! - Request body limit

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use jokes_common::config::TomlConfig;
use jokes_submit::config::SubmissionConfig;
use jokes_submit::{build_router, AppState};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot` method

const MAX_BODY_BYTES: usize = 4 * 1024;

/// Test helper: Create app storing submissions under `root`
fn setup_app(root: &Path) -> axum::Router {
    let config = SubmissionConfig::from_toml(&TomlConfig::default(), root.to_path_buf()).unwrap();
    let state = AppState::from_config(Arc::new(config), false, MAX_BODY_BYTES);
    build_router(state)
}

/// Test helper: Create request with a body
fn test_request(method: &str, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

/// Test helper: Extract body as text
async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    serde_json::from_str(&extract_text(body).await).expect("Should parse JSON")
}

fn content_type(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn twopart_joke() -> String {
    json!({
        "formatVersion": 3,
        "category": "Pun",
        "type": "twopart",
        "setup": "What do you call a fake noodle?",
        "delivery": "An impasta.",
        "flags": {
            "nsfw": false, "religious": false, "political": false,
            "racist": false, "sexist": false, "explicit": false
        },
        "lang": "en"
    })
    .to_string()
}

// =============================================================================
// Health Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "jokes-submit");
    assert!(body["version"].is_string());
    assert_eq!(body["submissions"], 0);
    assert_eq!(body["rate_limited"], 0);
}

#[tokio::test]
async fn test_health_counts_submissions() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .clone()
        .oneshot(test_request("POST", "/submit", twopart_joke()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let body = extract_json(app.oneshot(request).await.unwrap().into_body()).await;
    assert_eq!(body["submissions"], 1);
}

// =============================================================================
// Submit Endpoint Tests
// =============================================================================

#[tokio::test]
async fn test_submit_stores_joke() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("POST", "/submit", twopart_joke()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(content_type(&response), "application/json");

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], false);
    assert_eq!(body["submission"]["type"], "twopart");
    assert_eq!(body["submission"]["delivery"], "An impasta.");
    assert_eq!(body["submission"]["safe"], false);

    // No peer address in oneshot requests
    let stored: Vec<_> = std::fs::read_dir(temp_dir.path().join("en"))
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].starts_with("submission_unknown_0_"), "{}", stored[0]);

    // Stored with four-space indentation
    let text = std::fs::read_to_string(temp_dir.path().join("en").join(&stored[0])).unwrap();
    assert!(text.contains("\n    \"category\": \"Pun\""), "{}", text);
}

#[tokio::test]
async fn test_put_is_accepted() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("PUT", "/submit", twopart_joke()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_xml_response_format() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("POST", "/submit?format=xml", twopart_joke()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(content_type(&response), "application/xml");

    let body = extract_text(response.into_body()).await;
    assert!(body.starts_with("<?xml version='1.0'?>"), "{}", body);
    assert!(body.contains("<error>false</error>"));
    assert!(body.contains("<setup>What do you call a fake noodle?</setup>"));
}

#[tokio::test]
async fn test_yaml_rejection_format() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("POST", "/submit?format=yaml", "not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(content_type(&response), "application/x-yaml");

    let body: Value = serde_yaml::from_str(&extract_text(response.into_body()).await).unwrap();
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], 105);
}

#[tokio::test]
async fn test_unknown_format_falls_back_to_json() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("POST", "/submit?format=csv", twopart_joke()))
        .await
        .unwrap();

    assert_eq!(content_type(&response), "application/json");
}

#[tokio::test]
async fn test_dry_run_stores_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    for uri in ["/submit?dry-run", "/submit?dryrun"] {
        let response = app
            .clone()
            .oneshot(test_request("POST", uri, twopart_joke()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"], false);
        assert!(body.get("submission").is_none());
    }

    assert!(!temp_dir.path().join("en").exists());
}

#[tokio::test]
async fn test_invalid_json_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("POST", "/submit", "{\"category\": "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"], true);
    assert_eq!(body["internalError"], false);
    assert_eq!(body["code"], 105);
    assert!(body["timestamp"].is_i64());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let body = format!("{{\"joke\": \"{}\"}}", "a".repeat(MAX_BODY_BYTES * 2));
    let response = app
        .oneshot(test_request("POST", "/submit", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_get_submit_not_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let app = setup_app(temp_dir.path());

    let response = app
        .oneshot(test_request("GET", "/submit", Body::empty()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
