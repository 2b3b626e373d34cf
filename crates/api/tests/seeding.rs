//! Tests for seeding the schema registry from a directory of records.

mod common;

use std::path::PathBuf;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, get, post_json, register_and_login};
use dsu_api::registry::{seed_from_dir, SeedError, SeedReport};
use dsu_core::validation::ValidationEngine;
use dsu_db::Bins;
use serde_json::json;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/schemas")
}

#[tokio::test]
async fn seeding_stores_once_and_validates_uploads() {
    let bins = Bins::memory();
    let engine = ValidationEngine::new();

    let report = seed_from_dir(&bins, &engine, &fixtures()).await.unwrap();
    assert_eq!(
        report,
        SeedReport {
            stored: 2,
            already_present: 0
        }
    );

    let again = seed_from_dir(&bins, &engine, &fixtures()).await.unwrap();
    assert_eq!(again.stored, 0);
    assert_eq!(again.already_present, 2);

    let app = common::build_test_app(bins);
    let json = body_json(get(&app, "/v1").await).await;
    assert_eq!(json["metadata"]["count"], 2);

    let alice = register_and_login(&app, "alice").await;
    let uri = format!("/v1/mood/1/data?auth_token={alice}");

    let ok = post_json(&app, &uri, json!([{ "data": { "level": "high" } }])).await;
    assert_eq!(ok.status(), StatusCode::CREATED);

    let bad = post_json(&app, &uri, json!([{ "data": { "level": "ecstatic" } }])).await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_directory_is_an_io_error() {
    let bins = Bins::memory();
    let engine = ValidationEngine::new();

    let result = seed_from_dir(&bins, &engine, &fixtures().join("missing")).await;
    assert_matches!(result, Err(SeedError::Io { .. }));
}
