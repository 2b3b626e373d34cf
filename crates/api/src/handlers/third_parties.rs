//! Handlers for the `/third-parties` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dsu_core::error::CoreError;
use dsu_core::third_party::{NewThirdParty, ThirdParty, ThirdPartyInfo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /v1/third-parties
///
/// Register an application owned by the caller. The response is the only
/// place the client secret is ever returned.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewThirdParty>,
) -> AppResult<(StatusCode, Json<DataResponse<ThirdParty>>)> {
    let third_party = ThirdParty::register(&user.username, input)?;
    state.bins.third_parties.store(&third_party).await?;

    tracing::info!(
        owner = %user.username,
        third_party_id = %third_party.id,
        "Third party registered"
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: third_party }),
    ))
}

/// GET /v1/third-parties
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ThirdPartyInfo>>>> {
    let owned = state.bins.third_parties.list_for_owner(&user.username).await?;
    Ok(Json(DataResponse {
        data: owned.iter().map(ThirdPartyInfo::from).collect(),
    }))
}

/// GET /v1/third-parties/{id}
///
/// Other users' applications are reported as not found.
pub async fn get_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<ThirdPartyInfo>>> {
    let third_party = state
        .bins
        .third_parties
        .find(&id)
        .await?
        .filter(|tp| tp.owner == user.username)
        .ok_or_else(|| CoreError::not_found("ThirdParty", &id))?;
    Ok(Json(DataResponse {
        data: ThirdPartyInfo::from(&third_party),
    }))
}
