//! In-process engine. Each table sits behind one `RwLock`, so the uniqueness
//! check and the insert it guards happen under the same write lock.

use std::collections::{BTreeMap, HashMap};

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
use tokio::sync::RwLock;

use crate::bins::{
    AuthenticationTokenBin, AuthorizationCodeBin, AuthorizationTokenBin, DataBin, SchemaBin,
    StoreHealth, ThirdPartyBin, UserBin, VerificationBin,
};
use crate::error::{at_most_one, require_key, require_schema_shape, require_scopes, DbError, DbResult};
use crate::query::{DataQuery, SchemaQuery};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    third_parties: RwLock<HashMap<String, ThirdParty>>,
    authentication_tokens: RwLock<HashMap<String, AuthenticationToken>>,
    authorization_codes: RwLock<HashMap<String, AuthorizationCode>>,
    verifications: RwLock<HashMap<String, AuthorizationCodeVerification>>,
    authorization_tokens: RwLock<Vec<AuthorizationToken>>,
    data: RwLock<Vec<Data>>,
    schemas: RwLock<BTreeMap<(String, i64), SchemaRecord>>,
}

fn insert_unique<V: Clone>(
    table: &mut HashMap<String, V>,
    entity: &'static str,
    key: &str,
    value: &V,
) -> DbResult<()> {
    require_key(entity, key)?;
    if table.contains_key(key) {
        return Err(DbError::Conflict {
            entity,
            key: key.to_string(),
        });
    }
    table.insert(key.to_string(), value.clone());
    Ok(())
}

#[async_trait]
impl UserBin for MemoryStore {
    async fn store(&self, user: &User) -> DbResult<()> {
        let mut users = self.users.write().await;
        insert_unique(&mut users, "user", &user.username, user)
    }

    async fn find(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }
}

#[async_trait]
impl ThirdPartyBin for MemoryStore {
    async fn store(&self, third_party: &ThirdParty) -> DbResult<()> {
        let mut table = self.third_parties.write().await;
        insert_unique(&mut table, "third party", &third_party.id, third_party)
    }

    async fn find(&self, id: &str) -> DbResult<Option<ThirdParty>> {
        Ok(self.third_parties.read().await.get(id).cloned())
    }

    async fn list_for_owner(&self, owner: &str) -> DbResult<Vec<ThirdParty>> {
        let mut found: Vec<ThirdParty> = self
            .third_parties
            .read()
            .await
            .values()
            .filter(|tp| tp.owner == owner)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

#[async_trait]
impl AuthenticationTokenBin for MemoryStore {
    async fn store(&self, token: &AuthenticationToken) -> DbResult<()> {
        let mut table = self.authentication_tokens.write().await;
        insert_unique(&mut table, "authentication token", &token.token, token)
    }

    async fn find_live(
        &self,
        token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthenticationToken>> {
        Ok(self
            .authentication_tokens
            .read()
            .await
            .get(token)
            .filter(|t| t.expires > now)
            .cloned())
    }
}

#[async_trait]
impl AuthorizationCodeBin for MemoryStore {
    async fn store(&self, code: &AuthorizationCode) -> DbResult<()> {
        require_scopes(code)?;
        let mut table = self.authorization_codes.write().await;
        insert_unique(&mut table, "authorization code", &code.code, code)
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCode>> {
        Ok(self.authorization_codes.read().await.get(code).cloned())
    }
}

#[async_trait]
impl VerificationBin for MemoryStore {
    async fn store(&self, verification: &AuthorizationCodeVerification) -> DbResult<()> {
        let mut table = self.verifications.write().await;
        insert_unique(
            &mut table,
            "authorization code verification",
            &verification.authorization_code,
            verification,
        )
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCodeVerification>> {
        Ok(self.verifications.read().await.get(code).cloned())
    }
}

#[async_trait]
impl AuthorizationTokenBin for MemoryStore {
    async fn store(&self, token: &AuthorizationToken) -> DbResult<()> {
        require_key("authorization token", &token.access_token)?;
        require_key("authorization token", &token.refresh_token)?;
        let mut table = self.authorization_tokens.write().await;
        if let Some(taken) = table.iter().find_map(|t| {
            if t.access_token == token.access_token {
                Some(&token.access_token)
            } else if t.refresh_token == token.refresh_token {
                Some(&token.refresh_token)
            } else {
                None
            }
        }) {
            return Err(DbError::Conflict {
                entity: "authorization token",
                key: taken.clone(),
            });
        }
        table.push(token.clone());
        Ok(())
    }

    async fn find_live_by_access_token(
        &self,
        access_token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthorizationToken>> {
        let table = self.authorization_tokens.read().await;
        let rows = table
            .iter()
            .filter(|t| t.access_token == access_token && t.expiration_time > now)
            .cloned()
            .collect();
        at_most_one("authorization token", access_token, rows)
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> DbResult<Option<AuthorizationToken>> {
        let table = self.authorization_tokens.read().await;
        let rows = table
            .iter()
            .filter(|t| t.refresh_token == refresh_token)
            .cloned()
            .collect();
        at_most_one("authorization token", refresh_token, rows)
    }
}

#[async_trait]
impl DataBin for MemoryStore {
    async fn store_all(&self, data: &[Data]) -> DbResult<()> {
        for item in data {
            require_key("data", &item.owner)?;
        }
        self.data.write().await.extend_from_slice(data);
        Ok(())
    }

    async fn query(&self, query: &DataQuery) -> DbResult<Page<Data>> {
        let table = self.data.read().await;
        // Reverse insertion order first so the stable sort keeps newest
        // insertions ahead among equal timestamps.
        let mut matches: Vec<&Data> = table
            .iter()
            .rev()
            .filter(|d| {
                d.owner == query.owner
                    && d.schema_id == query.schema_id
                    && d.schema_version == query.schema_version
            })
            .collect();
        matches.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        let total = matches.len() as u64;
        let items = query.page.slice(matches.into_iter().cloned());
        Ok(Page { items, total })
    }
}

#[async_trait]
impl SchemaBin for MemoryStore {
    async fn store(&self, schema: &SchemaRecord) -> DbResult<()> {
        require_schema_shape(schema)?;
        let mut table = self.schemas.write().await;
        let key = (schema.id.clone(), schema.version);
        if table.contains_key(&key) {
            return Err(DbError::Conflict {
                entity: "schema",
                key: format!("{}/{}", schema.id, schema.version),
            });
        }
        table.insert(key, schema.clone());
        Ok(())
    }

    async fn find(&self, id: &str, version: i64) -> DbResult<Option<SchemaRecord>> {
        Ok(self
            .schemas
            .read()
            .await
            .get(&(id.to_string(), version))
            .cloned())
    }

    async fn list(&self, query: &SchemaQuery) -> DbResult<Page<SchemaRecord>> {
        let table = self.schemas.read().await;
        let matches: Vec<&SchemaRecord> = table
            .values()
            .filter(|s| query.id.as_deref().map_or(true, |id| s.id == id))
            .filter(|s| query.version.map_or(true, |v| s.version == v))
            .collect();
        let total = matches.len() as u64;
        let items = query.page.slice(matches.into_iter().cloned());
        Ok(Page { items, total })
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}
