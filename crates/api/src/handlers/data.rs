//! Handlers for `/v1/{schema_id}/{version}/data`.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use dsu_core::authorization::check_access;
use dsu_core::data::{parse_upload, Data};
use dsu_core::error::CoreError;
use dsu_core::projection::ColumnList;
use dsu_core::types::now_millis;
use dsu_db::DataQuery;
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{bearer_token, AuthUser};
use crate::query::{self, PaginationParams};
use crate::registry::load_schema;
use crate::response::PagedResponse;
use crate::state::AppState;

/// POST /v1/{schema_id}/{version}/data
///
/// Validate every uploaded point against the schema, then store them all.
/// Nothing is stored unless every point is valid.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    Path((schema_id, version)): Path<(String, i64)>,
    Json(payload): Json<Value>,
) -> AppResult<StatusCode> {
    let schema = load_schema(&state, &schema_id, version).await?;
    let elements = parse_upload(&payload)?;

    let now = now_millis();
    let points = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            schema
                .validate_data(&user.username, element.meta_data, element.data, now)
                .map_err(|err| match err {
                    CoreError::Validation(msg) => {
                        CoreError::Validation(format!("Data point {index}: {msg}"))
                    }
                    other => other,
                })
        })
        .collect::<Result<Vec<Data>, CoreError>>()?;

    state.bins.data.store_all(&points).await?;

    tracing::info!(
        owner = %user.username,
        schema_id = schema.id(),
        version = schema.version(),
        count = points.len(),
        "Data uploaded"
    );
    Ok(StatusCode::CREATED)
}

/// GET /v1/{schema_id}/{version}/data
///
/// Query parameters: `owner`, `num_to_skip`, `num_to_return`, and
/// `column_list` (repeatable or comma-separated).
///
/// Without `owner`, the caller reads their own data. Reading another user's
/// data needs an `Authorization: Bearer` token granted by that user for this
/// schema.
pub async fn read(
    State(state): State<AppState>,
    user: Option<AuthUser>,
    headers: HeaderMap,
    Path((schema_id, version)): Path<(String, i64)>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> AppResult<Json<PagedResponse<Data>>> {
    let owner = query::first(&pairs, "owner")
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());
    let paging = PaginationParams {
        num_to_skip: query::parse_i64(&pairs, "num_to_skip")?,
        num_to_return: query::parse_i64(&pairs, "num_to_return")?,
    };
    let columns = ColumnList::parse(query::repeated(&pairs, "column_list"))?;
    let bearer = bearer_token(&headers)?;

    let schema = load_schema(&state, &schema_id, version).await?;
    let owner = resolve_owner(&state, user.as_ref(), bearer.as_deref(), owner, schema.id()).await?;

    let query = DataQuery {
        owner,
        schema_id: schema.id().to_string(),
        schema_version: schema.version(),
        page: paging.page(&state.config.paging)?,
    };
    let page = state.bins.data.query(&query).await?;

    let page = if columns.is_empty() {
        page
    } else {
        page.map(|mut point| {
            point.data = columns.project(&point.data);
            point
        })
    };

    Ok(Json(page.into()))
}

/// Decide whose data is being read and whether the caller may read it.
async fn resolve_owner(
    state: &AppState,
    user: Option<&AuthUser>,
    bearer: Option<&str>,
    requested: Option<String>,
    schema_id: &str,
) -> AppResult<String> {
    let owner = match (requested, user) {
        (Some(owner), _) => owner,
        (None, Some(user)) => user.username.clone(),
        (None, None) if bearer.is_some() => {
            return Err(CoreError::Validation("The owner parameter is required".into()).into())
        }
        (None, None) => {
            return Err(CoreError::Unauthorized("Missing authentication token".into()).into())
        }
    };

    if user.is_some_and(|u| u.username == owner) {
        return Ok(owner);
    }

    let Some(access_token) = bearer else {
        return Err(match user {
            Some(_) => CoreError::Forbidden(
                "Reading another user's data requires an authorization token".into(),
            ),
            None => CoreError::Unauthorized("Missing authentication token".into()),
        }
        .into());
    };

    let now = now_millis();
    let bins = &state.bins;
    let token = bins
        .authorization_tokens
        .find_live_by_access_token(access_token, now)
        .await?;
    let code = match &token {
        Some(t) => bins.authorization_codes.find(&t.authorization_code).await?,
        None => None,
    };
    let verification = match &code {
        Some(c) => bins.verifications.find(&c.code).await?,
        None => None,
    };

    check_access(
        token.as_ref(),
        code.as_ref(),
        verification.as_ref(),
        schema_id,
        &owner,
        now,
    )
    .map_err(|err| {
        tracing::info!(owner = %owner, schema_id, error = %err, "Third-party read denied");
        AppError::from(err)
    })?;

    Ok(owner)
}
