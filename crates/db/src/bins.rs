//! Bin traits: one storage contract per entity kind.
//!
//! Shared contract for every engine:
//!
//! - `store` inserts, failing with [`DbError::Conflict`] when the natural key
//!   is taken and [`DbError::InvalidInput`] when it is empty;
//! - single-record lookups return `Ok(None)` for no match and
//!   [`DbError::Consistency`] if storage somehow holds several;
//! - lookups that respect expiry take `now` explicitly and match only records
//!   expiring strictly after it.
//!
//! [`DbError::Conflict`]: crate::DbError::Conflict
//! [`DbError::InvalidInput`]: crate::DbError::InvalidInput
//! [`DbError::Consistency`]: crate::DbError::Consistency

use std::sync::Arc;

use async_trait::async_trait;
use dsu_core::authentication::AuthenticationToken;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::data::Data;
use dsu_core::paging::Page;
use dsu_core::schema::SchemaRecord;
use dsu_core::third_party::ThirdParty;
use dsu_core::types::Timestamp;
use dsu_core::user::User;

use crate::error::DbResult;
use crate::memory::MemoryStore;
use crate::mongo::MongoStore;
use crate::postgres::PgStore;
use crate::query::{DataQuery, SchemaQuery};

#[async_trait]
pub trait UserBin: Send + Sync {
    async fn store(&self, user: &User) -> DbResult<()>;
    async fn find(&self, username: &str) -> DbResult<Option<User>>;
}

#[async_trait]
pub trait ThirdPartyBin: Send + Sync {
    async fn store(&self, third_party: &ThirdParty) -> DbResult<()>;
    async fn find(&self, id: &str) -> DbResult<Option<ThirdParty>>;
    /// Every third party registered by `owner`, ordered by name.
    async fn list_for_owner(&self, owner: &str) -> DbResult<Vec<ThirdParty>>;
}

#[async_trait]
pub trait AuthenticationTokenBin: Send + Sync {
    async fn store(&self, token: &AuthenticationToken) -> DbResult<()>;
    async fn find_live(&self, token: &str, now: Timestamp)
        -> DbResult<Option<AuthenticationToken>>;
}

#[async_trait]
pub trait AuthorizationCodeBin: Send + Sync {
    async fn store(&self, code: &AuthorizationCode) -> DbResult<()>;
    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCode>>;
}

#[async_trait]
pub trait VerificationBin: Send + Sync {
    /// At most one verification exists per authorization code.
    async fn store(&self, verification: &AuthorizationCodeVerification) -> DbResult<()>;
    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCodeVerification>>;
}

#[async_trait]
pub trait AuthorizationTokenBin: Send + Sync {
    /// Conflicts if either the access or the refresh value is taken.
    async fn store(&self, token: &AuthorizationToken) -> DbResult<()>;
    async fn find_live_by_access_token(
        &self,
        access_token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthorizationToken>>;
    /// Not filtered by expiry.
    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> DbResult<Option<AuthorizationToken>>;
}

#[async_trait]
pub trait DataBin: Send + Sync {
    /// Insert every record or none.
    async fn store_all(&self, data: &[Data]) -> DbResult<()>;
    /// Newest first by meta-data timestamp. Records without a timestamp come
    /// last; ties fall back to most recently inserted first.
    async fn query(&self, query: &DataQuery) -> DbResult<Page<Data>>;
}

#[async_trait]
pub trait SchemaBin: Send + Sync {
    async fn store(&self, schema: &SchemaRecord) -> DbResult<()>;
    async fn find(&self, id: &str, version: i64) -> DbResult<Option<SchemaRecord>>;
    /// Ordered by `(id, version)`; `total` counts matches before paging.
    async fn list(&self, query: &SchemaQuery) -> DbResult<Page<SchemaRecord>>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Engine name for logs and the health endpoint.
    fn engine(&self) -> &'static str;
    async fn ping(&self) -> DbResult<()>;
}

/// Handles to every bin, all backed by the same engine.
#[derive(Clone)]
pub struct Bins {
    pub users: Arc<dyn UserBin>,
    pub third_parties: Arc<dyn ThirdPartyBin>,
    pub authentication_tokens: Arc<dyn AuthenticationTokenBin>,
    pub authorization_codes: Arc<dyn AuthorizationCodeBin>,
    pub verifications: Arc<dyn VerificationBin>,
    pub authorization_tokens: Arc<dyn AuthorizationTokenBin>,
    pub data: Arc<dyn DataBin>,
    pub schemas: Arc<dyn SchemaBin>,
    pub health: Arc<dyn StoreHealth>,
}

impl Bins {
    fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserBin
            + ThirdPartyBin
            + AuthenticationTokenBin
            + AuthorizationCodeBin
            + VerificationBin
            + AuthorizationTokenBin
            + DataBin
            + SchemaBin
            + StoreHealth
            + 'static,
    {
        Self {
            users: store.clone(),
            third_parties: store.clone(),
            authentication_tokens: store.clone(),
            authorization_codes: store.clone(),
            verifications: store.clone(),
            authorization_tokens: store.clone(),
            data: store.clone(),
            schemas: store.clone(),
            health: store,
        }
    }

    /// Fresh, empty in-memory bins.
    pub fn memory() -> Self {
        Self::from_store(Arc::new(MemoryStore::default()))
    }

    pub fn postgres(pool: crate::DbPool) -> Self {
        Self::from_store(Arc::new(PgStore::new(pool)))
    }

    pub fn mongo(store: MongoStore) -> Self {
        Self::from_store(Arc::new(store))
    }
}
