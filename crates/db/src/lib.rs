//! Storage for the DSU.
//!
//! Every entity kind has its own bin trait (see [`bins`]). Three engines
//! implement all of them with identical semantics:
//!
//! - [`postgres::PgStore`] over a sqlx connection pool,
//! - [`mongo::MongoStore`] over a MongoDB database,
//! - [`memory::MemoryStore`] for local development and tests.
//!
//! The engine is picked once at startup and handed out as a [`Bins`] bundle.

pub mod bins;
pub mod error;
pub mod memory;
pub mod mongo;
pub mod postgres;
pub mod query;

pub use bins::{
    AuthenticationTokenBin, AuthorizationCodeBin, AuthorizationTokenBin, Bins, DataBin,
    SchemaBin, StoreHealth, ThirdPartyBin, UserBin, VerificationBin,
};
pub use error::{DbError, DbResult};
pub use query::{DataQuery, SchemaQuery};

use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the bundled migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
