//! HTTP-level tests for data upload and query.

mod common;

use axum::http::StatusCode;
use common::{bins_with_schemas, body_json, get, post_json, register_and_login, store_schema};
use dsu_db::Bins;
use serde_json::json;

#[tokio::test]
async fn owner_writes_and_reads_back_own_data() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;

    let response = post_json(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}"),
        json!([{ "data": {} }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(&app, &format!("/v1/weight/1/data?auth_token={alice}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["metadata"]["count"], 1);
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["owner"], "alice");
    assert_eq!(json["data"][0]["schema_id"], "weight");
    assert_eq!(json["data"][0]["schema_version"], 1);
    assert_eq!(json["data"][0]["data"], json!({}));
}

#[tokio::test]
async fn results_are_newest_first_and_paged() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;

    let points: Vec<_> = (1..=5)
        .map(|i| {
            json!({
                "meta_data": { "timestamp": format!("2024-01-0{i}T08:00:00Z") },
                "data": { "kg": i },
            })
        })
        .collect();
    let response = post_json(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}"),
        json!(points),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = get(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}&num_to_skip=1&num_to_return=2"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["metadata"]["count"], 5);
    let kgs: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["data"]["kg"].as_i64().unwrap())
        .collect();
    assert_eq!(kgs, [4, 3]);
}

#[tokio::test]
async fn invalid_point_rejects_the_whole_upload() {
    let bins = Bins::memory();
    store_schema(
        &bins,
        "mood",
        1,
        json!({
            "type": "object",
            "properties": { "level": { "type": "string", "allowed_values": ["low", "high"] } },
            "required": ["level"]
        }),
    )
    .await;
    let app = common::build_test_app(bins);
    let alice = register_and_login(&app, "alice").await;

    let response = post_json(
        &app,
        &format!("/v1/mood/1/data?auth_token={alice}"),
        json!([{ "data": { "level": "low" } }, { "data": { "level": "medium" } }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(get(&app, &format!("/v1/mood/1/data?auth_token={alice}")).await).await;
    assert_eq!(json["metadata"]["count"], 0);
}

#[tokio::test]
async fn malformed_uploads_are_rejected() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;
    let uri = format!("/v1/weight/1/data?auth_token={alice}");

    for body in [
        json!({ "data": {} }),
        json!([{ "value": 1 }]),
        json!([{ "data": null }]),
        json!([{ "meta_data": { "unknown": 1 }, "data": {} }]),
        json!([{ "meta_data": { "timestamp": "3000-01-01T00:00:00Z" }, "data": {} }]),
    ] {
        let response = post_json(&app, &uri, body.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
    }
}

#[tokio::test]
async fn unknown_schema_is_not_found() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;

    let response = post_json(
        &app,
        &format!("/v1/weight/2/data?auth_token={alice}"),
        json!([{ "data": {} }]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&app, &format!("/v1/steps/1/data?auth_token={alice}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reading_requires_credentials() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;
    register_and_login(&app, "bob").await;

    let response = get(&app, "/v1/weight/1/data").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/v1/weight/1/data?owner=alice").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get(&app, "/v1/weight/1/data?auth_token=stale").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logged in, but bob's data needs a grant.
    let response = get(&app, &format!("/v1/weight/1/data?owner=bob&auth_token={alice}")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(&app, "/v1/weight/1/data", json!([{ "data": {} }])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn paging_parameters_are_checked() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;

    for query in ["num_to_return=101", "num_to_skip=-1", "num_to_return=0", "num_to_skip=ten"] {
        let response = get(&app, &format!("/v1/weight/1/data?auth_token={alice}&{query}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "query: {query}");
    }
}

#[tokio::test]
async fn column_list_projects_the_payload() {
    let app = common::build_test_app(bins_with_schemas(&[("weight", 1)]).await);
    let alice = register_and_login(&app, "alice").await;

    post_json(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}"),
        json!([{ "data": { "kg": 70, "unit": "metric", "source": { "device": "scale", "fw": "1.2" } } }]),
    )
    .await;

    let response = get(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}&column_list=kg&column_list=source.device"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["data"], json!({ "kg": 70, "source": { "device": "scale" } }));

    let response = get(
        &app,
        &format!("/v1/weight/1/data?auth_token={alice}&column_list=kg,unit"),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["data"], json!({ "kg": 70, "unit": "metric" }));
}
