use async_trait::async_trait;
use dsu_core::authentication::AuthenticationToken;
use dsu_core::third_party::ThirdParty;
use dsu_core::types::Timestamp;
use dsu_core::user::User;

use super::{classify_insert_error, PgStore};
use crate::bins::{AuthenticationTokenBin, ThirdPartyBin, UserBin};
use crate::error::{at_most_one, require_key, DbResult};

const THIRD_PARTY_COLUMNS: &str = "owner, id, secret, name, description, redirect_uri";

#[derive(sqlx::FromRow)]
struct UserRow {
    username: String,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct ThirdPartyRow {
    owner: String,
    id: String,
    secret: String,
    name: String,
    description: Option<String>,
    redirect_uri: String,
}

impl From<ThirdPartyRow> for ThirdParty {
    fn from(row: ThirdPartyRow) -> Self {
        Self {
            owner: row.owner,
            id: row.id,
            secret: row.secret,
            name: row.name,
            description: row.description,
            redirect_uri: row.redirect_uri,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthenticationTokenRow {
    token: String,
    username: String,
    granted: Timestamp,
    expires: Timestamp,
}

#[async_trait]
impl UserBin for PgStore {
    async fn store(&self, user: &User) -> DbResult<()> {
        require_key("user", &user.username)?;
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ($1, $2)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| classify_insert_error(e, "user", &user.username))?;
        Ok(())
    }

    async fn find(&self, username: &str) -> DbResult<Option<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT username, password_hash FROM users WHERE username = $1 LIMIT 2",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;
        let users = rows
            .into_iter()
            .map(|r| User {
                username: r.username,
                password_hash: r.password_hash,
            })
            .collect();
        at_most_one("user", username, users)
    }
}

#[async_trait]
impl ThirdPartyBin for PgStore {
    async fn store(&self, tp: &ThirdParty) -> DbResult<()> {
        require_key("third party", &tp.id)?;
        let query = format!(
            "INSERT INTO third_parties ({THIRD_PARTY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
        );
        sqlx::query(&query)
            .bind(&tp.owner)
            .bind(&tp.id)
            .bind(&tp.secret)
            .bind(&tp.name)
            .bind(&tp.description)
            .bind(&tp.redirect_uri)
            .execute(&self.pool)
            .await
            .map_err(|e| classify_insert_error(e, "third party", &tp.id))?;
        Ok(())
    }

    async fn find(&self, id: &str) -> DbResult<Option<ThirdParty>> {
        let query = format!("SELECT {THIRD_PARTY_COLUMNS} FROM third_parties WHERE id = $1 LIMIT 2");
        let rows = sqlx::query_as::<_, ThirdPartyRow>(&query)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        at_most_one("third party", id, rows.into_iter().map(Into::into).collect())
    }

    async fn list_for_owner(&self, owner: &str) -> DbResult<Vec<ThirdParty>> {
        let query = format!(
            "SELECT {THIRD_PARTY_COLUMNS} FROM third_parties WHERE owner = $1 ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, ThirdPartyRow>(&query)
            .bind(owner)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl AuthenticationTokenBin for PgStore {
    async fn store(&self, token: &AuthenticationToken) -> DbResult<()> {
        require_key("authentication token", &token.token)?;
        sqlx::query(
            "INSERT INTO authentication_tokens (token, username, granted, expires)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&token.token)
        .bind(&token.username)
        .bind(token.granted)
        .bind(token.expires)
        .execute(&self.pool)
        .await
        .map_err(|e| classify_insert_error(e, "authentication token", &token.token))?;
        Ok(())
    }

    async fn find_live(
        &self,
        token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthenticationToken>> {
        let rows = sqlx::query_as::<_, AuthenticationTokenRow>(
            "SELECT token, username, granted, expires FROM authentication_tokens
             WHERE token = $1 AND expires > $2 LIMIT 2",
        )
        .bind(token)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        let tokens = rows
            .into_iter()
            .map(|r| AuthenticationToken {
                token: r.token,
                username: r.username,
                granted: r.granted,
                expires: r.expires,
            })
            .collect();
        at_most_one("authentication token", token, tokens)
    }
}
