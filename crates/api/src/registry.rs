//! Schema registry access and startup seeding.

use std::path::{Path, PathBuf};

use dsu_core::error::CoreError;
use dsu_core::schema::{Schema, SchemaRecord};
use dsu_core::validation::{validate_schema_id, validate_version, ValidationEngine};
use dsu_db::{Bins, DbError};

use crate::error::AppResult;
use crate::state::AppState;

/// Look up a schema and compile it for validation.
pub async fn load_schema(state: &AppState, id: &str, version: i64) -> AppResult<Schema> {
    let id = validate_schema_id(id)?;
    let version = validate_version(version)?;
    let record = state
        .bins
        .schemas
        .find(&id, version)
        .await?
        .ok_or_else(|| CoreError::not_found("Schema", format!("{id}/{version}")))?;

    // Stored records were compiled before being stored, so a failure here
    // means the record changed underneath us.
    Schema::compile(record, &state.engine).map_err(|e| {
        CoreError::Internal(format!("Stored schema {id}/{version} no longer compiles: {e}")).into()
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Cannot read schema directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema file {path} is not a schema record: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Schema file {path} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: CoreError,
    },

    #[error(transparent)]
    Store(#[from] DbError),
}

/// Outcome of a seeding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub stored: usize,
    pub already_present: usize,
}

/// Store every `*.json` schema record in `dir` that the registry lacks.
///
/// Records are validated and compiled first; an invalid file aborts seeding.
/// Existing `(id, version)` pairs are left untouched.
pub async fn seed_from_dir(
    bins: &Bins,
    engine: &ValidationEngine,
    dir: &Path,
) -> Result<SeedReport, SeedError> {
    let io_error = |source: std::io::Error| SeedError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut report = SeedReport::default();
    for path in paths {
        let raw = tokio::fs::read(&path).await.map_err(|source| SeedError::Io {
            path: path.clone(),
            source,
        })?;
        let record: SchemaRecord =
            serde_json::from_slice(&raw).map_err(|source| SeedError::Parse {
                path: path.clone(),
                source,
            })?;
        let schema = Schema::compile(record, engine).map_err(|source| SeedError::Invalid {
            path: path.clone(),
            source,
        })?;

        match bins.schemas.store(schema.record()).await {
            Ok(()) => {
                tracing::info!(id = schema.id(), version = schema.version(), "Seeded schema");
                report.stored += 1;
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(id = schema.id(), version = schema.version(), "Schema already present");
                report.already_present += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(report)
}
