#![allow(dead_code)]

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use dsu_core::schema::SchemaRecord;
use dsu_db::Bins;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use dsu_api::config::{PagingConfig, ServerConfig, StorageConfig, TokenConfig};
use dsu_api::router::build_app_router;
use dsu_api::state::AppState;

pub const PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` backed by in-memory storage.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        storage: StorageConfig::Memory,
        tokens: TokenConfig::default(),
        paging: PagingConfig::default(),
        password_min_length: 8,
        schema_dir: None,
    }
}

/// Build the full application router over `bins`, using the same middleware
/// stack as production.
pub fn build_test_app(bins: Bins) -> Router {
    let config = test_config();
    let state = AppState::new(bins, config.clone());
    build_app_router(state, &config).expect("test config is valid")
}

/// Fresh in-memory bins with the given `(id, version)` schemas registered.
/// Each schema accepts any JSON object.
pub async fn bins_with_schemas(schemas: &[(&str, i64)]) -> Bins {
    let bins = Bins::memory();
    for (id, version) in schemas {
        store_schema(&bins, id, *version, json!({ "type": "object" })).await;
    }
    bins
}

pub async fn store_schema(bins: &Bins, id: &str, version: i64, definition: Value) {
    let record = SchemaRecord {
        id: id.to_string(),
        version,
        chunk_size: 100,
        time_authoritative: false,
        time_zone_authoritative: false,
        definition,
    };
    bins.schemas.store(&record).await.expect("schema stored");
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("infallible")
}

pub async fn get(app: &Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn get_bearer(app: &Router, uri: &str, access_token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {access_token}"))
        .body(Body::empty())
        .expect("valid request");
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request");
    send(app, request).await
}

/// Register a user and log them in, returning the authentication token.
pub async fn register_and_login(app: &Router, username: &str) -> String {
    let credentials = json!({ "username": username, "password": PASSWORD });

    let response = post_json(app, "/v1/users", credentials.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_json(app, "/v1/auth", credentials).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    json["data"]["auth_token"]
        .as_str()
        .expect("auth_token present")
        .to_string()
}

/// Register a third party owned by the holder of `auth_token`, returning
/// `(client_id, client_secret)`.
pub async fn register_third_party(app: &Router, auth_token: &str, name: &str) -> (String, String) {
    let response = post_json(
        app,
        &format!("/v1/third-parties?auth_token={auth_token}"),
        json!({
            "name": name,
            "description": "Test application",
            "redirect_uri": "https://app.example.com/callback",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["data"]["id"].as_str().expect("id").to_string(),
        json["data"]["secret"].as_str().expect("secret").to_string(),
    )
}

/// Request a code for `scopes` as the given client.
pub async fn request_code(app: &Router, client: &(String, String), scopes: &[&str]) -> String {
    let response = post_json(
        app,
        "/v1/auth/oauth/code",
        json!({
            "client_id": client.0,
            "client_secret": client.1,
            "scopes": scopes,
            "state": "xyz",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["code"]
        .as_str()
        .expect("code")
        .to_string()
}

pub async fn decide(app: &Router, auth_token: &str, code: &str, granted: bool) -> Response {
    post_json(
        app,
        &format!("/v1/auth/oauth/authorization?auth_token={auth_token}"),
        json!({ "code": code, "granted": granted }),
    )
    .await
}

pub async fn exchange_code(app: &Router, client: &(String, String), code: &str) -> Response {
    post_json(
        app,
        "/v1/auth/oauth/token",
        json!({
            "grant_type": "authorization_code",
            "client_id": client.0,
            "client_secret": client.1,
            "code": code,
        }),
    )
    .await
}
