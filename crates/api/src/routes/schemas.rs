//! Route definitions for the schema registry.

use axum::routing::get;
use axum::Router;

use crate::handlers::schemas;
use crate::state::AppState;

/// ```text
/// GET /                        -> list_all
/// GET /{schema_id}             -> list_versions
/// GET /{schema_id}/{version}   -> get_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(schemas::list_all))
        .route("/{schema_id}", get(schemas::list_versions))
        .route("/{schema_id}/{version}", get(schemas::get_version))
}
