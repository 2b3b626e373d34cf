use std::collections::BTreeSet;

use async_trait::async_trait;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::types::Timestamp;

use super::{classify_insert_error, PgStore};
use crate::bins::{AuthorizationCodeBin, AuthorizationTokenBin, VerificationBin};
use crate::error::{at_most_one, require_key, require_scopes, DbResult};

const TOKEN_COLUMNS: &str =
    "authorization_code, access_token, refresh_token, creation_time, expiration_time";

#[derive(sqlx::FromRow)]
struct CodeRow {
    third_party_id: String,
    code: String,
    creation_time: Timestamp,
    expiration_time: Timestamp,
    scopes: Vec<String>,
    state: Option<String>,
}

impl From<CodeRow> for AuthorizationCode {
    fn from(row: CodeRow) -> Self {
        Self {
            third_party_id: row.third_party_id,
            code: row.code,
            creation_time: row.creation_time,
            expiration_time: row.expiration_time,
            scopes: row.scopes.into_iter().collect::<BTreeSet<_>>(),
            state: row.state,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VerificationRow {
    authorization_code: String,
    owner: String,
    granted: bool,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    authorization_code: String,
    access_token: String,
    refresh_token: String,
    creation_time: Timestamp,
    expiration_time: Timestamp,
}

impl From<TokenRow> for AuthorizationToken {
    fn from(row: TokenRow) -> Self {
        Self {
            authorization_code: row.authorization_code,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            creation_time: row.creation_time,
            expiration_time: row.expiration_time,
        }
    }
}

#[async_trait]
impl AuthorizationCodeBin for PgStore {
    async fn store(&self, code: &AuthorizationCode) -> DbResult<()> {
        require_scopes(code)?;
        let scopes: Vec<&str> = code.scopes.iter().map(String::as_str).collect();
        sqlx::query(
            "INSERT INTO authorization_codes
                 (code, third_party_id, creation_time, expiration_time, scopes, state)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(&code.code)
        .bind(&code.third_party_id)
        .bind(code.creation_time)
        .bind(code.expiration_time)
        .bind(&scopes)
        .bind(&code.state)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, "authorization code", &code.code))?;
        Ok(())
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCode>> {
        let rows = sqlx::query_as::<_, CodeRow>(
            "SELECT third_party_id, code, creation_time, expiration_time, scopes, state
             FROM authorization_codes WHERE code = $1 LIMIT 2",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        at_most_one("authorization code", code, rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl VerificationBin for PgStore {
    async fn store(&self, verification: &AuthorizationCodeVerification) -> DbResult<()> {
        let key = &verification.authorization_code;
        require_key("authorization code verification", key)?;
        sqlx::query(
            "INSERT INTO authorization_code_verifications (authorization_code, owner, granted)
             VALUES ($1, $2, $3)",
        )
        .bind(key)
        .bind(&verification.owner)
        .bind(verification.granted)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, "authorization code verification", key))?;
        Ok(())
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCodeVerification>> {
        let rows = sqlx::query_as::<_, VerificationRow>(
            "SELECT authorization_code, owner, granted
             FROM authorization_code_verifications WHERE authorization_code = $1 LIMIT 2",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;
        let found = rows
            .into_iter()
            .map(|r| AuthorizationCodeVerification {
                authorization_code: r.authorization_code,
                owner: r.owner,
                granted: r.granted,
            })
            .collect();
        at_most_one("authorization code verification", code, found)
    }
}

#[async_trait]
impl AuthorizationTokenBin for PgStore {
    async fn store(&self, token: &AuthorizationToken) -> DbResult<()> {
        require_key("authorization token", &token.access_token)?;
        require_key("authorization token", &token.refresh_token)?;
        let query = format!("INSERT INTO authorization_tokens ({TOKEN_COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        sqlx::query(&query)
            .bind(&token.authorization_code)
            .bind(&token.access_token)
            .bind(&token.refresh_token)
            .bind(token.creation_time)
            .bind(token.expiration_time)
            .execute(&self.pool)
            .await
            .map_err(|e| classify_insert_error(e, "authorization token", &token.access_token))?;
        Ok(())
    }

    async fn find_live_by_access_token(
        &self,
        access_token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthorizationToken>> {
        let query = format!(
            "SELECT {TOKEN_COLUMNS} FROM authorization_tokens
             WHERE access_token = $1 AND expiration_time > $2 LIMIT 2"
        );
        let rows = sqlx::query_as::<_, TokenRow>(&query)
            .bind(access_token)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        at_most_one("authorization token", access_token, rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> DbResult<Option<AuthorizationToken>> {
        let query = format!(
            "SELECT {TOKEN_COLUMNS} FROM authorization_tokens WHERE refresh_token = $1 LIMIT 2"
        );
        let rows = sqlx::query_as::<_, TokenRow>(&query)
            .bind(refresh_token)
            .fetch_all(&self.pool)
            .await?;
        at_most_one("authorization token", refresh_token, rows.into_iter().map(Into::into).collect())
    }
}
