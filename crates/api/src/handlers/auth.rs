//! Handler for `POST /v1/auth` (login).

use axum::extract::State;
use axum::Json;
use dsu_core::authentication::AuthenticationToken;
use dsu_core::error::CoreError;
use dsu_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::auth::password::{verify_missing_account, verify_password};
use crate::auth::session::set_auth_cookie;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /v1/auth`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub auth_token: String,
    pub expires: Timestamp,
}

fn bad_credentials() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Username or password is incorrect".into(),
    ))
}

/// POST /v1/auth
///
/// Exchange username and password for an authentication token. The token is
/// returned in the body and set as the `dsu_auth_token` cookie.
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    let Some(user) = state.bins.users.find(input.username.trim()).await? else {
        verify_missing_account(&input.password);
        tracing::info!("Login rejected for unknown user");
        return Err(bad_credentials());
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::info!(username = %user.username, "Login rejected");
        return Err(bad_credentials());
    }

    let lifetime = state.config.tokens.authentication_lifetime;
    let token = AuthenticationToken::mint(&user.username, lifetime);
    state.bins.authentication_tokens.store(&token).await?;
    set_auth_cookie(&cookies, &token.token, lifetime);

    tracing::info!(username = %user.username, "User logged in");
    Ok(Json(DataResponse {
        data: LoginResponse {
            auth_token: token.token,
            expires: token.expires,
        },
    }))
}
