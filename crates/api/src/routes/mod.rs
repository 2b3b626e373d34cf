pub mod auth;
pub mod data;
pub mod health;
pub mod schemas;
pub mod third_parties;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users                                   register (public)
///
/// /auth                                    login (public)
/// /auth/oauth/code                         third party requests a code
/// /auth/oauth/authorization                owner inspects (GET) or decides (POST)
/// /auth/oauth/token                        code or refresh-token exchange
///
/// /third-parties                           list, register (requires auth)
/// /third-parties/{id}                      get (owner only)
///
/// /                                        list schemas
/// /{schema_id}                             list versions of a schema
/// /{schema_id}/{version}                   get one schema version
/// /{schema_id}/{version}/data              read, write data points
/// ```
///
/// The static prefixes take precedence over `{schema_id}`, so schema ids
/// `users`, `auth` and `third-parties` cannot be reached over HTTP.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::users::register))
        .nest("/auth", auth::router())
        .nest("/third-parties", third_parties::router())
        .merge(data::router())
        .merge(schemas::router())
}
