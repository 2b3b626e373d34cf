//! Build the storage bins for the configured engine.

use dsu_db::mongo::MongoStore;
use dsu_db::{Bins, DbError};

use crate::config::StorageConfig;

/// Connect to the configured engine and return its bins.
///
/// PostgreSQL migrations and MongoDB indexes are applied here.
pub async fn connect(config: &StorageConfig) -> Result<Bins, DbError> {
    match config {
        StorageConfig::Postgres { database_url } => {
            let pool = dsu_db::create_pool(database_url).await?;
            tracing::info!("Database connection pool created");

            dsu_db::run_migrations(&pool)
                .await
                .map_err(|e| DbError::Backend(Box::new(e)))?;
            tracing::info!("Database migrations applied");

            Ok(Bins::postgres(pool))
        }
        StorageConfig::MongoDb { uri, database } => {
            let store = MongoStore::connect(uri, database).await?;
            tracing::info!(database = %database, "MongoDB connected, indexes ensured");
            Ok(Bins::mongo(store))
        }
        StorageConfig::Memory => {
            tracing::warn!("Using in-memory storage; nothing survives a restart");
            Ok(Bins::memory())
        }
    }
}
