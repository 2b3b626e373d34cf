use axum::routing::get;
use axum::Router;

use crate::handlers::data;
use crate::state::AppState;

/// ```text
/// GET  /{schema_id}/{version}/data   -> read
/// POST /{schema_id}/{version}/data   -> upload (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{schema_id}/{version}/data",
        get(data::read).post(data::upload),
    )
}
