//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, oauth};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /                       -> login
/// POST /oauth/code             -> request_code (client credentials)
/// GET  /oauth/authorization    -> inspect (requires auth)
/// POST /oauth/authorization    -> decide (requires auth)
/// POST /oauth/token            -> token (client credentials)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(auth::login))
        .route("/oauth/code", post(oauth::request_code))
        .route(
            "/oauth/authorization",
            get(oauth::inspect).post(oauth::decide),
        )
        .route("/oauth/token", post(oauth::token))
}
