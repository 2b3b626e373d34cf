//! Route definitions for the `/third-parties` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::third_parties;
use crate::state::AppState;

/// Routes mounted at `/third-parties`. All require authentication.
///
/// ```text
/// GET  /       -> list
/// POST /       -> create
/// GET  /{id}   -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(third_parties::list).post(third_parties::create))
        .route("/{id}", get(third_parties::get_by_id))
}
