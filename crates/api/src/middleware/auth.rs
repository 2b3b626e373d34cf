//! Authentication-token extractor for Axum handlers.

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use dsu_core::error::CoreError;
use dsu_core::types::now_millis;
use tower_cookies::Cookies;

use crate::auth::session::{AUTH_COOKIE, AUTH_QUERY_PARAM};
use crate::error::AppError;
use crate::query;
use crate::state::AppState;

/// Authenticated user resolved from a live authentication token.
///
/// The token is read from the `dsu_auth_token` cookie, falling back to the
/// `auth_token` query parameter.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(username = %user.username, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub username: String,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing authentication token".into(),
            ))
        })?;
        resolve(state, &token).await
    }
}

/// `Option<AuthUser>` is `None` only when no token was presented at all.
/// A presented token that is unknown or expired is still rejected.
impl OptionalFromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        match presented_token(parts)? {
            Some(token) => resolve(state, &token).await.map(Some),
            None => Ok(None),
        }
    }
}

fn presented_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let from_cookie = parts
        .extensions
        .get::<Cookies>()
        .and_then(|cookies| cookies.get(AUTH_COOKIE))
        .map(|cookie| cookie.value().to_string());
    if from_cookie.is_some() {
        return Ok(from_cookie);
    }

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    Ok(query::first(&pairs, AUTH_QUERY_PARAM))
}

async fn resolve(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let session = state
        .bins
        .authentication_tokens
        .find_live(token, now_millis())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid or expired authentication token".into(),
            ))
        })?;

    Ok(AuthUser {
        username: session.username,
        token: session.token,
    })
}

/// The access token from an `Authorization: Bearer <token>` header, if any.
///
/// A header that is present but not a bearer token is an error rather than
/// being ignored.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| {
        AppError::Core(CoreError::Forbidden("Malformed Authorization header".into()))
    })?;
    let token = value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;
    Ok(Some(token.to_string()))
}
