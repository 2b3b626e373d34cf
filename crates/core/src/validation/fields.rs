//! Standalone, side-effect-free field validators.

use std::collections::BTreeSet;

use crate::data::MetaData;
use crate::error::CoreError;
use crate::types::Timestamp;

/// Maximum accepted username length in characters.
pub const MAX_USERNAME_LENGTH: usize = 64;

/// Validate a schema id. Returns the trimmed id.
pub fn validate_schema_id(id: &str) -> Result<String, CoreError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Schema id must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

/// Validate a schema version. Versions are strictly positive.
pub fn validate_version(version: i64) -> Result<i64, CoreError> {
    if version <= 0 {
        return Err(CoreError::Validation(format!(
            "Schema version must be positive, got {version}"
        )));
    }
    Ok(version)
}

/// Validate a schema chunk size. Chunk sizes are strictly positive.
pub fn validate_chunk_size(chunk_size: i64) -> Result<i64, CoreError> {
    if chunk_size <= 0 {
        return Err(CoreError::Validation(format!(
            "Chunk size must be positive, got {chunk_size}"
        )));
    }
    Ok(chunk_size)
}

/// Validate a username. Returns the trimmed username.
pub fn validate_username(username: &str) -> Result<String, CoreError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Username must not be empty".into()));
    }
    if trimmed.chars().count() > MAX_USERNAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters long"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a set of authorization scopes.
///
/// Each scope names a schema id, so it follows [`validate_schema_id`]. The
/// resulting set must not be empty; duplicates collapse.
pub fn validate_scopes<I, S>(scopes: I) -> Result<BTreeSet<String>, CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set = BTreeSet::new();
    for scope in scopes {
        let scope = validate_schema_id(scope.as_ref())
            .map_err(|_| CoreError::Validation("Scopes must not be empty strings".into()))?;
        set.insert(scope);
    }
    if set.is_empty() {
        return Err(CoreError::Validation(
            "At least one scope must be requested".into(),
        ));
    }
    Ok(set)
}

/// Validate data-point meta-data. The timestamp, if present, must not be
/// later than `now`.
pub fn validate_meta_data(meta: &MetaData, now: Timestamp) -> Result<(), CoreError> {
    match meta.timestamp {
        Some(ts) if ts > now => Err(CoreError::Validation(format!(
            "Meta-data timestamp {} is in the future",
            ts.to_rfc3339()
        ))),
        _ => Ok(()),
    }
}
