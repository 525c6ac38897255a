//! Integration tests for the admin REST surface.
//!
//! Tests use Axum's `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. This validates handler logic and routing
//! without needing a live network connection.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlscope_server::{build_router, AppState, Registry, RegistryConfig};
use tower::ServiceExt;

async fn make_test_state(dir: &std::path::Path) -> Arc<AppState> {
    let registry = Arc::new(Registry::new(RegistryConfig {
        poll_interval: Duration::from_secs(600),
        row_limit: 100,
    }));
    registry.switch(&dir.join("api.sqlite")).await.unwrap();
    Arc::new(AppState::new(registry, 4321))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn index_returns_html_with_bound_port() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_test_state(dir.path()).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("4321"));
    assert!(html.contains("api.sqlite"));
}

#[tokio::test]
async fn get_database_returns_current_path() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_test_state(dir.path()).await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/database").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert!(json["path"].as_str().unwrap().ends_with("api.sqlite"));
}

#[tokio::test]
async fn post_database_switches_and_reports_resolved_path() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_test_state(dir.path()).await;
    let router = build_router(state);

    let target = dir.path().join("next.sqlite");
    let body = serde_json::json!({ "dbPath": target.display().to_string() }).to_string();

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/database")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], true);
    assert!(json["path"].as_str().unwrap().ends_with("next.sqlite"));

    // The read-only endpoint reflects the switch.
    let response = router
        .oneshot(Request::get("/api/database").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_to_json(response.into_body()).await;
    assert!(json["path"].as_str().unwrap().ends_with("next.sqlite"));
}

#[tokio::test]
async fn post_database_with_missing_parent_fails() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_test_state(dir.path()).await;
    let router = build_router(state);

    let target = dir.path().join("absent").join("x.sqlite");
    let body = serde_json::json!({ "dbPath": target.display().to_string() }).to_string();

    let response = router
        .oneshot(
            Request::post("/api/database")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["success"], false);
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("directory not found"));
}
