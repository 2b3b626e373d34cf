//! PostgreSQL engine.
//!
//! One table per entity; natural keys carry `uq_`-prefixed unique
//! constraints so a violated key surfaces as SQLSTATE 23505 and becomes
//! [`DbError::Conflict`].

mod authorization;
mod identity;
mod registry;

use async_trait::async_trait;

use crate::bins::StoreHealth;
use crate::error::{DbError, DbResult};
use crate::DbPool;

/// All bins backed by one connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-constraint violation to a conflict on `key`; anything else
/// passes through as a backend error.
fn classify_insert_error(err: sqlx::Error, entity: &'static str, key: &str) -> DbError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505")
            && db_err.constraint().is_some_and(|c| c.starts_with("uq_"))
        {
            return DbError::Conflict {
                entity,
                key: key.to_string(),
            };
        }
    }
    tracing::error!(entity, error = %err, "Insert failed");
    DbError::from(err)
}

#[async_trait]
impl StoreHealth for PgStore {
    fn engine(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
