use dsu_core::authorization::AuthorizationCode;
use dsu_core::schema::SchemaRecord;

/// Errors raised by storage bins.
///
/// The variants are engine-independent: each engine translates its own
/// driver errors into these.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The entity handed to a bin cannot be stored as given.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A natural key is already taken.
    #[error("{entity} with key '{key}' already exists")]
    Conflict { entity: &'static str, key: String },

    /// A lookup that must match at most one record matched several.
    #[error("Expected at most one {entity} for key '{key}' but found several")]
    Consistency { entity: &'static str, key: String },

    /// A stored record could not be turned back into its entity.
    #[error("Stored {entity} is corrupt: {reason}")]
    Corrupt { entity: &'static str, reason: String },

    /// Any other driver failure.
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type DbResult<T> = Result<T, DbError>;

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Backend(Box::new(err))
    }
}

impl From<mongodb::error::Error> for DbError {
    fn from(err: mongodb::error::Error) -> Self {
        DbError::Backend(Box::new(err))
    }
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict { .. })
    }
}

/// Reduce a lookup result to at most one record.
pub fn at_most_one<T>(entity: &'static str, key: &str, mut rows: Vec<T>) -> DbResult<Option<T>> {
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        _ => {
            tracing::error!(entity, key, matches = rows.len(), "Uniqueness violated in storage");
            Err(DbError::Consistency {
                entity,
                key: key.to_string(),
            })
        }
    }
}

/// Reject an empty natural key before it reaches storage.
pub fn require_key(entity: &'static str, key: &str) -> DbResult<()> {
    if key.trim().is_empty() {
        return Err(DbError::InvalidInput(format!("{entity} has an empty key")));
    }
    Ok(())
}

/// Reject an authorization code that covers no schema.
pub fn require_scopes(code: &AuthorizationCode) -> DbResult<()> {
    require_key("authorization code", &code.code)?;
    if code.scopes.is_empty() {
        return Err(DbError::InvalidInput(
            "authorization code has no scopes".into(),
        ));
    }
    Ok(())
}

/// Reject a schema record whose key or sizes could never have been compiled.
pub fn require_schema_shape(schema: &SchemaRecord) -> DbResult<()> {
    require_key("schema", &schema.id)?;
    if schema.version <= 0 {
        return Err(DbError::InvalidInput(format!(
            "schema {} has non-positive version {}",
            schema.id, schema.version
        )));
    }
    if schema.chunk_size <= 0 {
        return Err(DbError::InvalidInput(format!(
            "schema {}/{} has non-positive chunk size {}",
            schema.id, schema.version, schema.chunk_size
        )));
    }
    Ok(())
}
