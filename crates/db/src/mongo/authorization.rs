use async_trait::async_trait;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::types::Timestamp;
use mongodb::bson::doc;

use super::documents::{AuthorizationCodeDoc, AuthorizationTokenDoc, VerificationDoc};
use super::{
    find_at_most_one, insert, MongoStore, AUTHORIZATION_CODES, AUTHORIZATION_TOKENS,
    VERIFICATIONS,
};
use crate::bins::{AuthorizationCodeBin, AuthorizationTokenBin, VerificationBin};
use crate::error::{require_key, require_scopes, DbResult};

#[async_trait]
impl AuthorizationCodeBin for MongoStore {
    async fn store(&self, code: &AuthorizationCode) -> DbResult<()> {
        require_scopes(code)?;
        let collection = self.collection::<AuthorizationCodeDoc>(AUTHORIZATION_CODES);
        insert(
            &collection,
            &AuthorizationCodeDoc::from(code),
            "authorization code",
            &code.code,
        )
        .await
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCode>> {
        let collection = self.collection::<AuthorizationCodeDoc>(AUTHORIZATION_CODES);
        find_at_most_one(&collection, doc! { "code": code }, "authorization code", code)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}

#[async_trait]
impl VerificationBin for MongoStore {
    async fn store(&self, verification: &AuthorizationCodeVerification) -> DbResult<()> {
        let key = &verification.authorization_code;
        require_key("authorization code verification", key)?;
        let collection = self.collection::<VerificationDoc>(VERIFICATIONS);
        insert(
            &collection,
            verification,
            "authorization code verification",
            key,
        )
        .await
    }

    async fn find(&self, code: &str) -> DbResult<Option<AuthorizationCodeVerification>> {
        let collection = self.collection::<VerificationDoc>(VERIFICATIONS);
        find_at_most_one(
            &collection,
            doc! { "authorization_code": code },
            "authorization code verification",
            code,
        )
        .await
    }
}

#[async_trait]
impl AuthorizationTokenBin for MongoStore {
    async fn store(&self, token: &AuthorizationToken) -> DbResult<()> {
        require_key("authorization token", &token.access_token)?;
        require_key("authorization token", &token.refresh_token)?;
        let collection = self.collection::<AuthorizationTokenDoc>(AUTHORIZATION_TOKENS);
        insert(
            &collection,
            &AuthorizationTokenDoc::from(token),
            "authorization token",
            &token.access_token,
        )
        .await
    }

    async fn find_live_by_access_token(
        &self,
        access_token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthorizationToken>> {
        let collection = self.collection::<AuthorizationTokenDoc>(AUTHORIZATION_TOKENS);
        let filter = doc! {
            "access_token": access_token,
            "expiration_time": { "$gt": now.timestamp_millis() },
        };
        find_at_most_one(&collection, filter, "authorization token", access_token)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }

    async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> DbResult<Option<AuthorizationToken>> {
        let collection = self.collection::<AuthorizationTokenDoc>(AUTHORIZATION_TOKENS);
        find_at_most_one(
            &collection,
            doc! { "refresh_token": refresh_token },
            "authorization token",
            refresh_token,
        )
        .await?
        .map(TryInto::try_into)
        .transpose()
    }
}
