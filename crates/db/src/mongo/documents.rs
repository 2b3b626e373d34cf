//! Stored document shapes and their conversions.
//!
//! Timestamps are kept as epoch milliseconds. Schema definitions are kept as
//! JSON text because JSON Schema keywords such as `$schema` and `$ref` are
//! awkward as stored field names.

use dsu_core::authentication::AuthenticationToken;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::data::{Data, MetaData};
use dsu_core::schema::SchemaRecord;
use dsu_core::third_party::ThirdParty;
use dsu_core::types::{from_millis, Timestamp};
use dsu_core::user::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{DbError, DbResult};

fn timestamp(entity: &'static str, millis: i64) -> DbResult<Timestamp> {
    from_millis(millis).ok_or_else(|| DbError::Corrupt {
        entity,
        reason: format!("timestamp {millis} out of range"),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UserDoc {
    pub username: String,
    pub password_hash: String,
}

impl From<&User> for UserDoc {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            password_hash: user.password_hash.clone(),
        }
    }
}

impl From<UserDoc> for User {
    fn from(doc: UserDoc) -> Self {
        Self {
            username: doc.username,
            password_hash: doc.password_hash,
        }
    }
}

// ThirdParty already has a flat serde shape; it is stored as-is.
pub(crate) type ThirdPartyDoc = ThirdParty;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AuthenticationTokenDoc {
    pub token: String,
    pub username: String,
    pub granted: i64,
    pub expires: i64,
}

impl From<&AuthenticationToken> for AuthenticationTokenDoc {
    fn from(t: &AuthenticationToken) -> Self {
        Self {
            token: t.token.clone(),
            username: t.username.clone(),
            granted: t.granted.timestamp_millis(),
            expires: t.expires.timestamp_millis(),
        }
    }
}

impl TryFrom<AuthenticationTokenDoc> for AuthenticationToken {
    type Error = DbError;

    fn try_from(doc: AuthenticationTokenDoc) -> DbResult<Self> {
        Ok(Self {
            token: doc.token,
            username: doc.username,
            granted: timestamp("authentication token", doc.granted)?,
            expires: timestamp("authentication token", doc.expires)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AuthorizationCodeDoc {
    pub third_party_id: String,
    pub code: String,
    pub creation_time: i64,
    pub expiration_time: i64,
    pub scopes: Vec<String>,
    pub state: Option<String>,
}

impl From<&AuthorizationCode> for AuthorizationCodeDoc {
    fn from(c: &AuthorizationCode) -> Self {
        Self {
            third_party_id: c.third_party_id.clone(),
            code: c.code.clone(),
            creation_time: c.creation_time.timestamp_millis(),
            expiration_time: c.expiration_time.timestamp_millis(),
            scopes: c.scopes.iter().cloned().collect(),
            state: c.state.clone(),
        }
    }
}

impl TryFrom<AuthorizationCodeDoc> for AuthorizationCode {
    type Error = DbError;

    fn try_from(doc: AuthorizationCodeDoc) -> DbResult<Self> {
        Ok(Self {
            third_party_id: doc.third_party_id,
            code: doc.code,
            creation_time: timestamp("authorization code", doc.creation_time)?,
            expiration_time: timestamp("authorization code", doc.expiration_time)?,
            scopes: doc.scopes.into_iter().collect(),
            state: doc.state,
        })
    }
}

pub(crate) type VerificationDoc = AuthorizationCodeVerification;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AuthorizationTokenDoc {
    pub authorization_code: String,
    pub access_token: String,
    pub refresh_token: String,
    pub creation_time: i64,
    pub expiration_time: i64,
}

impl From<&AuthorizationToken> for AuthorizationTokenDoc {
    fn from(t: &AuthorizationToken) -> Self {
        Self {
            authorization_code: t.authorization_code.clone(),
            access_token: t.access_token.clone(),
            refresh_token: t.refresh_token.clone(),
            creation_time: t.creation_time.timestamp_millis(),
            expiration_time: t.expiration_time.timestamp_millis(),
        }
    }
}

impl TryFrom<AuthorizationTokenDoc> for AuthorizationToken {
    type Error = DbError;

    fn try_from(doc: AuthorizationTokenDoc) -> DbResult<Self> {
        Ok(Self {
            authorization_code: doc.authorization_code,
            access_token: doc.access_token,
            refresh_token: doc.refresh_token,
            creation_time: timestamp("authorization token", doc.creation_time)?,
            expiration_time: timestamp("authorization token", doc.expiration_time)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SchemaDoc {
    pub id: String,
    pub version: i64,
    pub chunk_size: i64,
    pub time_authoritative: bool,
    pub time_zone_authoritative: bool,
    pub definition: String,
}

impl TryFrom<&SchemaRecord> for SchemaDoc {
    type Error = DbError;

    fn try_from(s: &SchemaRecord) -> DbResult<Self> {
        let definition = serde_json::to_string(&s.definition)
            .map_err(|e| DbError::InvalidInput(format!("schema definition: {e}")))?;
        Ok(Self {
            id: s.id.clone(),
            version: s.version,
            chunk_size: s.chunk_size,
            time_authoritative: s.time_authoritative,
            time_zone_authoritative: s.time_zone_authoritative,
            definition,
        })
    }
}

impl TryFrom<SchemaDoc> for SchemaRecord {
    type Error = DbError;

    fn try_from(doc: SchemaDoc) -> DbResult<Self> {
        let definition = serde_json::from_str(&doc.definition).map_err(|e| DbError::Corrupt {
            entity: "schema",
            reason: e.to_string(),
        })?;
        Ok(Self {
            id: doc.id,
            version: doc.version,
            chunk_size: doc.chunk_size,
            time_authoritative: doc.time_authoritative,
            time_zone_authoritative: doc.time_zone_authoritative,
            definition,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct DataDoc {
    pub owner: String,
    pub schema_id: String,
    pub schema_version: i64,
    pub meta_id: Option<String>,
    pub meta_timestamp: Option<i64>,
    pub data: Value,
}

impl From<&Data> for DataDoc {
    fn from(d: &Data) -> Self {
        let meta = d.meta_data.clone().unwrap_or_default();
        Self {
            owner: d.owner.clone(),
            schema_id: d.schema_id.clone(),
            schema_version: d.schema_version,
            meta_id: meta.id,
            meta_timestamp: meta.timestamp.map(|ts| ts.timestamp_millis()),
            data: d.data.clone(),
        }
    }
}

impl TryFrom<DataDoc> for Data {
    type Error = DbError;

    fn try_from(doc: DataDoc) -> DbResult<Self> {
        let meta = MetaData {
            id: doc.meta_id,
            timestamp: doc
                .meta_timestamp
                .map(|ms| timestamp("data", ms))
                .transpose()?,
        };
        Ok(Self {
            owner: doc.owner,
            schema_id: doc.schema_id,
            schema_version: doc.schema_version,
            meta_data: Some(meta).filter(|m| !m.is_empty()),
            data: doc.data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsu_core::types::now_millis;
    use serde_json::json;

    #[test]
    fn schema_definition_survives_text_storage() {
        let record = SchemaRecord {
            id: "weight".into(),
            version: 1,
            chunk_size: 10,
            time_authoritative: false,
            time_zone_authoritative: true,
            definition: json!({ "$schema": "https://json-schema.org/draft/2020-12/schema" }),
        };
        let doc = SchemaDoc::try_from(&record).unwrap();
        assert!(doc.definition.contains("$schema"));
        assert_eq!(SchemaRecord::try_from(doc).unwrap(), record);
    }

    #[test]
    fn data_without_meta_data_reads_back_as_none() {
        let data = Data {
            owner: "alice".into(),
            schema_id: "weight".into(),
            schema_version: 1,
            meta_data: None,
            data: json!({ "kg": 70 }),
        };
        let doc = DataDoc::from(&data);
        assert!(doc.meta_timestamp.is_none());
        assert_eq!(Data::try_from(doc).unwrap(), data);
    }

    #[test]
    fn token_timestamps_keep_milliseconds() {
        let token = AuthenticationToken::mint_at("alice", now_millis(), chrono::Duration::minutes(30));
        let doc = AuthenticationTokenDoc::from(&token);
        assert_eq!(AuthenticationToken::try_from(doc).unwrap(), token);
    }

    #[test]
    fn out_of_range_timestamp_is_corrupt() {
        let doc = AuthenticationTokenDoc {
            token: "t".into(),
            username: "alice".into(),
            granted: i64::MAX,
            expires: i64::MAX,
        };
        assert!(matches!(
            AuthenticationToken::try_from(doc),
            Err(DbError::Corrupt { .. })
        ));
    }
}
