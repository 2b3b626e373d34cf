use async_trait::async_trait;
use dsu_core::authentication::AuthenticationToken;
use dsu_core::third_party::ThirdParty;
use dsu_core::types::Timestamp;
use dsu_core::user::User;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;

use super::documents::{AuthenticationTokenDoc, ThirdPartyDoc, UserDoc};
use super::{find_at_most_one, insert, MongoStore, AUTHENTICATION_TOKENS, THIRD_PARTIES, USERS};
use crate::bins::{AuthenticationTokenBin, ThirdPartyBin, UserBin};
use crate::error::{require_key, DbResult};

#[async_trait]
impl UserBin for MongoStore {
    async fn store(&self, user: &User) -> DbResult<()> {
        require_key("user", &user.username)?;
        let users = self.collection::<UserDoc>(USERS);
        insert(&users, &UserDoc::from(user), "user", &user.username).await
    }

    async fn find(&self, username: &str) -> DbResult<Option<User>> {
        let users = self.collection::<UserDoc>(USERS);
        let found =
            find_at_most_one(&users, doc! { "username": username }, "user", username).await?;
        Ok(found.map(Into::into))
    }
}

#[async_trait]
impl ThirdPartyBin for MongoStore {
    async fn store(&self, third_party: &ThirdParty) -> DbResult<()> {
        require_key("third party", &third_party.id)?;
        let collection = self.collection::<ThirdPartyDoc>(THIRD_PARTIES);
        insert(&collection, third_party, "third party", &third_party.id).await
    }

    async fn find(&self, id: &str) -> DbResult<Option<ThirdParty>> {
        let collection = self.collection::<ThirdPartyDoc>(THIRD_PARTIES);
        find_at_most_one(&collection, doc! { "id": id }, "third party", id).await
    }

    async fn list_for_owner(&self, owner: &str) -> DbResult<Vec<ThirdParty>> {
        let collection = self.collection::<ThirdPartyDoc>(THIRD_PARTIES);
        let mut options = FindOptions::default();
        options.sort = Some(doc! { "name": 1, "id": 1 });
        let found = collection
            .find(doc! { "owner": owner })
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl AuthenticationTokenBin for MongoStore {
    async fn store(&self, token: &AuthenticationToken) -> DbResult<()> {
        require_key("authentication token", &token.token)?;
        let collection = self.collection::<AuthenticationTokenDoc>(AUTHENTICATION_TOKENS);
        insert(
            &collection,
            &AuthenticationTokenDoc::from(token),
            "authentication token",
            &token.token,
        )
        .await
    }

    async fn find_live(
        &self,
        token: &str,
        now: Timestamp,
    ) -> DbResult<Option<AuthenticationToken>> {
        let collection = self.collection::<AuthenticationTokenDoc>(AUTHENTICATION_TOKENS);
        let filter = doc! { "token": token, "expires": { "$gt": now.timestamp_millis() } };
        find_at_most_one(&collection, filter, "authentication token", token)
            .await?
            .map(TryInto::try_into)
            .transpose()
    }
}
