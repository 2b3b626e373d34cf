//! Handlers for the `/users` resource.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use dsu_core::user::{User, UserInfo};
use dsu_core::validation::validate_username;
use serde::Deserialize;

use crate::auth::password::{hash_password, validate_password_strength};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /v1/users`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// POST /v1/users
///
/// Register a resource owner. The username is trimmed; a taken username is a
/// conflict.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserInfo>>)> {
    let username = validate_username(&input.username)?;
    validate_password_strength(&input.password, state.config.password_min_length)?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let user = User {
        username,
        password_hash,
    };
    state.bins.users.store(&user).await?;

    tracing::info!(username = %user.username, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserInfo::from(&user),
        }),
    ))
}
