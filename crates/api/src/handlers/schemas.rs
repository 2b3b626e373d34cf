//! Handlers for the schema registry (`/v1`, `/v1/{schema_id}`,
//! `/v1/{schema_id}/{version}`).

use axum::extract::{Path, Query, State};
use axum::Json;
use dsu_core::error::CoreError;
use dsu_core::schema::SchemaRecord;
use dsu_core::validation::{validate_schema_id, validate_version};
use dsu_db::SchemaQuery;

use crate::error::AppResult;
use crate::query::PaginationParams;
use crate::response::{DataResponse, PagedResponse};
use crate::state::AppState;

/// GET /v1
///
/// Every registered schema, ordered by id then version.
pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PagedResponse<SchemaRecord>>> {
    let query = SchemaQuery {
        id: None,
        version: None,
        page: params.page(&state.config.paging)?,
    };
    let page = state.bins.schemas.list(&query).await?;
    Ok(Json(page.into()))
}

/// GET /v1/{schema_id}
///
/// Every version of one schema.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(schema_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<PagedResponse<SchemaRecord>>> {
    let query = SchemaQuery {
        id: Some(validate_schema_id(&schema_id)?),
        version: None,
        page: params.page(&state.config.paging)?,
    };
    let page = state.bins.schemas.list(&query).await?;
    Ok(Json(page.into()))
}

/// GET /v1/{schema_id}/{version}
pub async fn get_version(
    State(state): State<AppState>,
    Path((schema_id, version)): Path<(String, i64)>,
) -> AppResult<Json<DataResponse<SchemaRecord>>> {
    let schema_id = validate_schema_id(&schema_id)?;
    let version = validate_version(version)?;
    let record = state
        .bins
        .schemas
        .find(&schema_id, version)
        .await?
        .ok_or_else(|| CoreError::not_found("Schema", format!("{schema_id}/{version}")))?;
    Ok(Json(DataResponse { data: record }))
}
