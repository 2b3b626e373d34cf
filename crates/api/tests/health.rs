//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use dsu_db::Bins;

#[tokio::test]
async fn health_check_reports_storage_engine() {
    let app = common::build_test_app(Bins::memory());
    let response = get(&app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["storage"], "memory");
    assert_eq!(json["storage_healthy"], true);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = common::build_test_app(Bins::memory());
    let response = get(&app, "/this/route/does/not/exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
