//! Handlers for the delegated authorization flow under `/auth/oauth`.
//!
//! ```text
//! third party                      resource owner
//! POST /auth/oauth/code   ──code──▶ GET  /auth/oauth/authorization?code=
//!                                   POST /auth/oauth/authorization
//!        ◀──────── redirect_uri?code=&state= ─────────
//! POST /auth/oauth/token (grant_type=authorization_code | refresh_token)
//! ```

use std::collections::BTreeSet;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::error::CoreError;
use dsu_core::third_party::ThirdParty;
use dsu_core::types::{now_millis, Timestamp};
use serde::{Deserialize, Serialize};

use crate::auth::client::authenticate_client;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /v1/auth/oauth/code`.
#[derive(Debug, Deserialize)]
pub struct CodeRequest {
    pub client_id: String,
    pub client_secret: String,
    pub scopes: Vec<String>,
    pub state: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CodeResponse {
    pub code: String,
    pub scopes: BTreeSet<String>,
    pub expires: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CodeParams {
    pub code: String,
}

/// What the resource owner is asked to decide on.
#[derive(Debug, Serialize)]
pub struct PendingAuthorization {
    pub code: String,
    pub third_party_id: String,
    pub third_party_name: String,
    pub third_party_description: Option<String>,
    pub scopes: BTreeSet<String>,
    pub expires: Timestamp,
}

/// Request body for `POST /v1/auth/oauth/authorization`.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub code: String,
    pub granted: bool,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub granted: bool,
    /// Where the owner's user agent should be sent next.
    pub redirect_uri: String,
}

/// Request body for `POST /v1/auth/oauth/token`.
#[derive(Debug, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum TokenRequest {
    AuthorizationCode {
        client_id: String,
        client_secret: String,
        code: String,
    },
    RefreshToken {
        client_id: String,
        client_secret: String,
        refresh_token: String,
    },
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

impl From<&AuthorizationToken> for TokenResponse {
    fn from(token: &AuthorizationToken) -> Self {
        Self {
            access_token: token.access_token.clone(),
            refresh_token: token.refresh_token.clone(),
            token_type: "Bearer",
            expires_in: (token.expiration_time - token.creation_time).num_seconds(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/auth/oauth/code
///
/// A third party asks for a code covering a non-empty set of schema ids.
pub async fn request_code(
    State(state): State<AppState>,
    Json(input): Json<CodeRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<CodeResponse>>)> {
    let client = authenticate_client(&state, &input.client_id, &input.client_secret).await?;

    let code = AuthorizationCode::mint(
        &client.id,
        &input.scopes,
        input.state,
        state.config.tokens.code_lifetime,
        now_millis(),
    )?;
    state.bins.authorization_codes.store(&code).await?;

    tracing::info!(third_party_id = %client.id, scopes = ?code.scopes, "Authorization code issued");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CodeResponse {
                code: code.code,
                scopes: code.scopes,
                expires: code.expiration_time,
            },
        }),
    ))
}

/// GET /v1/auth/oauth/authorization?code=
///
/// The resource owner inspects a pending code before deciding.
pub async fn inspect(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<CodeParams>,
) -> AppResult<Json<DataResponse<PendingAuthorization>>> {
    let (code, third_party) = load_code(&state, &params.code).await?;
    if code.is_expired(now_millis()) {
        return Err(CoreError::Validation("Authorization code has expired".into()).into());
    }

    Ok(Json(DataResponse {
        data: PendingAuthorization {
            code: code.code,
            third_party_id: third_party.id,
            third_party_name: third_party.name,
            third_party_description: third_party.description,
            scopes: code.scopes,
            expires: code.expiration_time,
        },
    }))
}

/// POST /v1/auth/oauth/authorization
///
/// Record the owner's single decision on a code. A second decision for the
/// same code is a conflict whatever its value.
pub async fn decide(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<DecisionRequest>,
) -> AppResult<Json<DataResponse<DecisionResponse>>> {
    let (code, third_party) = load_code(&state, &input.code).await?;

    let verification =
        AuthorizationCodeVerification::decide(&code, &user.username, input.granted, now_millis())?;
    state
        .bins
        .verifications
        .store(&verification)
        .await
        .map_err(|err| {
            if err.is_conflict() {
                AppError::Core(CoreError::Conflict(
                    "This authorization code has already been decided".into(),
                ))
            } else {
                err.into()
            }
        })?;

    tracing::info!(
        owner = %user.username,
        third_party_id = %third_party.id,
        granted = input.granted,
        "Authorization decided"
    );
    Ok(Json(DataResponse {
        data: DecisionResponse {
            granted: input.granted,
            redirect_uri: redirect_uri(&third_party.redirect_uri, &code, input.granted),
        },
    }))
}

/// POST /v1/auth/oauth/token
///
/// Exchange a granted code, or a refresh token, for an access token.
pub async fn token(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> AppResult<Json<DataResponse<TokenResponse>>> {
    let lifetime = state.config.tokens.authorization_lifetime;
    let now = now_millis();

    let token = match input {
        TokenRequest::AuthorizationCode {
            client_id,
            client_secret,
            code,
        } => {
            let client = authenticate_client(&state, &client_id, &client_secret).await?;
            let code = state
                .bins
                .authorization_codes
                .find(&code)
                .await?
                .ok_or_else(|| CoreError::Validation("Unknown authorization code".into()))?;
            let verification = state.bins.verifications.find(&code.code).await?;
            AuthorizationToken::issue(&client.id, &code, verification.as_ref(), lifetime, now)?
        }
        TokenRequest::RefreshToken {
            client_id,
            client_secret,
            refresh_token,
        } => {
            let client = authenticate_client(&state, &client_id, &client_secret).await?;
            let previous = state
                .bins
                .authorization_tokens
                .find_by_refresh_token(&refresh_token)
                .await?
                .ok_or_else(|| CoreError::Validation("Unknown refresh token".into()))?;
            let code = state
                .bins
                .authorization_codes
                .find(&previous.authorization_code)
                .await?
                .ok_or_else(|| {
                    CoreError::Internal(format!(
                        "Authorization token references missing code {}",
                        previous.authorization_code
                    ))
                })?;
            if code.third_party_id != client.id {
                return Err(CoreError::Forbidden(
                    "Refresh token was issued to another third party".into(),
                )
                .into());
            }
            previous.refresh(lifetime, now)
        }
    };

    state.bins.authorization_tokens.store(&token).await?;
    tracing::info!(authorization_code = %token.authorization_code, "Authorization token issued");

    Ok(Json(DataResponse {
        data: TokenResponse::from(&token),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_code(state: &AppState, code: &str) -> AppResult<(AuthorizationCode, ThirdParty)> {
    let code = state
        .bins
        .authorization_codes
        .find(code)
        .await?
        .ok_or_else(|| CoreError::not_found("AuthorizationCode", code))?;
    let third_party = state
        .bins
        .third_parties
        .find(&code.third_party_id)
        .await?
        .ok_or_else(|| {
            CoreError::Internal(format!(
                "Authorization code {} references missing third party",
                code.code
            ))
        })?;
    Ok((code, third_party))
}

/// The third party's redirect URI with the outcome appended as query
/// parameters.
fn redirect_uri(base: &str, code: &AuthorizationCode, granted: bool) -> String {
    let Ok(mut url) = url::Url::parse(base) else {
        return base.to_string();
    };
    {
        let mut query = url.query_pairs_mut();
        if granted {
            query.append_pair("code", &code.code);
        } else {
            query.append_pair("error", "access_denied");
        }
        if let Some(state) = &code.state {
            query.append_pair("state", state);
        }
    }
    url.to_string()
}
