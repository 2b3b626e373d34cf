//! MongoDB engine.
//!
//! One collection per entity. Natural keys are backed by unique indexes that
//! [`MongoStore::connect`] creates, so a taken key surfaces as a duplicate-key
//! write error and becomes [`DbError::Conflict`]. Timestamps are stored as
//! milliseconds since the Unix epoch.

mod authorization;
mod documents;
mod identity;
mod registry;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;

use crate::bins::StoreHealth;
use crate::error::{at_most_one, DbError, DbResult};

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

pub(crate) const USERS: &str = "users";
pub(crate) const THIRD_PARTIES: &str = "third_parties";
pub(crate) const AUTHENTICATION_TOKENS: &str = "authentication_tokens";
pub(crate) const AUTHORIZATION_CODES: &str = "authorization_codes";
pub(crate) const VERIFICATIONS: &str = "authorization_code_verifications";
pub(crate) const AUTHORIZATION_TOKENS: &str = "authorization_tokens";
pub(crate) const SCHEMAS: &str = "schemas";
pub(crate) const DATA: &str = "data_points";

/// All bins backed by one MongoDB database.
#[derive(Debug, Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect and make sure every unique index exists.
    pub async fn connect(uri: &str, db_name: &str) -> DbResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        let store = Self::new(client.database(db_name));
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Wrap an existing database handle. Indexes are not touched.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub async fn ensure_indexes(&self) -> DbResult<()> {
        let unique = [
            (USERS, doc! { "username": 1 }),
            (THIRD_PARTIES, doc! { "id": 1 }),
            (AUTHENTICATION_TOKENS, doc! { "token": 1 }),
            (AUTHORIZATION_CODES, doc! { "code": 1 }),
            (VERIFICATIONS, doc! { "authorization_code": 1 }),
            (AUTHORIZATION_TOKENS, doc! { "access_token": 1 }),
            (AUTHORIZATION_TOKENS, doc! { "refresh_token": 1 }),
            (SCHEMAS, doc! { "id": 1, "version": 1 }),
        ];
        for (collection, keys) in unique {
            let model = IndexModel::builder()
                .keys(keys)
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.collection::<Document>(collection)
                .create_index(model)
                .await?;
        }

        let lookups = [
            (THIRD_PARTIES, doc! { "owner": 1 }),
            (
                DATA,
                doc! { "owner": 1, "schema_id": 1, "schema_version": 1, "meta_timestamp": -1 },
            ),
        ];
        for (collection, keys) in lookups {
            let model = IndexModel::builder().keys(keys).build();
            self.collection::<Document>(collection)
                .create_index(model)
                .await?;
        }

        tracing::info!(database = %self.db.name(), "MongoDB indexes ensured");
        Ok(())
    }
}

/// Insert one document, mapping a duplicate key to a conflict on `key`.
async fn insert<T>(
    collection: &Collection<T>,
    document: &T,
    entity: &'static str,
    key: &str,
) -> DbResult<()>
where
    T: serde::Serialize + Send + Sync,
{
    match collection.insert_one(document).await {
        Ok(_) => Ok(()),
        Err(err) => Err(classify_write_error(err, entity, key)),
    }
}

fn classify_write_error(err: mongodb::error::Error, entity: &'static str, key: &str) -> DbError {
    if let ErrorKind::Write(WriteFailure::WriteError(write_error)) = &*err.kind {
        if write_error.code == DUPLICATE_KEY {
            return DbError::Conflict {
                entity,
                key: key.to_string(),
            };
        }
    }
    tracing::error!(entity, error = %err, "Insert failed");
    DbError::from(err)
}

/// Read at most two matches and insist on no more than one.
async fn find_at_most_one<T>(
    collection: &Collection<T>,
    filter: Document,
    entity: &'static str,
    key: &str,
) -> DbResult<Option<T>>
where
    T: DeserializeOwned + Send + Sync + Unpin,
{
    let mut options = FindOptions::default();
    options.limit = Some(2);
    let docs: Vec<T> = collection
        .find(filter)
        .with_options(options)
        .await?
        .try_collect()
        .await?;
    at_most_one(entity, key, docs)
}

#[async_trait]
impl StoreHealth for MongoStore {
    fn engine(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> DbResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
