//! Behaviour every storage engine must share.
//!
//! Each check builds its own keys from fresh UUIDs so the suite can run
//! against a long-lived database without cleanup.

use assert_matches::assert_matches;
use chrono::Duration;
use dsu_core::authentication::AuthenticationToken;
use dsu_core::authorization::{
    AuthorizationCode, AuthorizationCodeVerification, AuthorizationToken,
};
use dsu_core::data::{Data, MetaData};
use dsu_core::paging::PageRequest;
use dsu_core::schema::SchemaRecord;
use dsu_core::third_party::{NewThirdParty, ThirdParty};
use dsu_core::types::{new_token, now_millis};
use dsu_core::user::User;
use dsu_db::{Bins, DataQuery, DbError, SchemaQuery};
use serde_json::json;

pub async fn run_all(bins: &Bins) {
    users_are_unique(bins).await;
    empty_keys_are_rejected(bins).await;
    third_parties_list_by_owner(bins).await;
    authentication_tokens_expire(bins).await;
    one_verification_per_code(bins).await;
    authorization_tokens(bins).await;
    schemas_page_in_order(bins).await;
    data_newest_first(bins).await;
    health(bins).await;
}

fn user(name: &str) -> User {
    User {
        username: name.to_string(),
        password_hash: "$argon2id$v=19$stub".to_string(),
    }
}

pub async fn users_are_unique(bins: &Bins) {
    let name = format!("alice-{}", new_token());
    bins.users.store(&user(&name)).await.unwrap();

    let err = bins.users.store(&user(&name)).await.unwrap_err();
    assert_matches!(err, DbError::Conflict { entity: "user", .. });

    let found = bins.users.find(&name).await.unwrap().unwrap();
    assert_eq!(found.username, name);
    assert!(bins.users.find("nobody-here").await.unwrap().is_none());
}

pub async fn empty_keys_are_rejected(bins: &Bins) {
    assert_matches!(
        bins.users.store(&user("")).await,
        Err(DbError::InvalidInput(_))
    );
    let mut schema = schema_record("x", 1);
    schema.id = " ".into();
    assert_matches!(
        bins.schemas.store(&schema).await,
        Err(DbError::InvalidInput(_))
    );

    let mut schema = schema_record(&format!("shape-{}", new_token()), 0);
    assert_matches!(
        bins.schemas.store(&schema).await,
        Err(DbError::InvalidInput(_))
    );
    schema.version = 1;
    schema.chunk_size = 0;
    assert_matches!(
        bins.schemas.store(&schema).await,
        Err(DbError::InvalidInput(_))
    );

    let now = now_millis();
    let unscoped = AuthorizationCode {
        third_party_id: new_token(),
        code: new_token(),
        creation_time: now,
        expiration_time: now + Duration::minutes(5),
        scopes: Default::default(),
        state: None,
    };
    assert_matches!(
        bins.authorization_codes.store(&unscoped).await,
        Err(DbError::InvalidInput(_))
    );
    assert!(bins
        .authorization_codes
        .find(&unscoped.code)
        .await
        .unwrap()
        .is_none());
}

pub async fn third_parties_list_by_owner(bins: &Bins) {
    let owner = format!("owner-{}", new_token());
    for name in ["zeta", "alpha"] {
        let tp = ThirdParty::register(
            &owner,
            NewThirdParty {
                name: name.into(),
                description: None,
                redirect_uri: "https://app.example/callback".into(),
            },
        )
        .unwrap();
        bins.third_parties.store(&tp).await.unwrap();
        assert_matches!(
            bins.third_parties.store(&tp).await,
            Err(DbError::Conflict { .. })
        );
        let found = bins.third_parties.find(&tp.id).await.unwrap().unwrap();
        assert_eq!(found, tp);
    }

    let listed = bins.third_parties.list_for_owner(&owner).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|tp| tp.name.as_str()).collect();
    assert_eq!(names, ["alpha", "zeta"]);
}

pub async fn authentication_tokens_expire(bins: &Bins) {
    let granted = now_millis();
    let token = AuthenticationToken::mint_at("alice", granted, Duration::minutes(30));
    bins.authentication_tokens.store(&token).await.unwrap();

    let live = bins
        .authentication_tokens
        .find_live(&token.token, granted)
        .await
        .unwrap();
    assert_eq!(live, Some(token.clone()));

    let at_expiry = bins
        .authentication_tokens
        .find_live(&token.token, token.expires)
        .await
        .unwrap();
    assert!(at_expiry.is_none());

    assert_matches!(
        bins.authentication_tokens.store(&token).await,
        Err(DbError::Conflict { .. })
    );
}

pub async fn one_verification_per_code(bins: &Bins) {
    let now = now_millis();
    let code = AuthorizationCode::mint(
        &new_token(),
        ["weight", "steps"],
        Some("opaque".into()),
        Duration::minutes(5),
        now,
    )
    .unwrap();
    bins.authorization_codes.store(&code).await.unwrap();
    assert_eq!(
        bins.authorization_codes.find(&code.code).await.unwrap(),
        Some(code.clone())
    );

    assert!(bins.verifications.find(&code.code).await.unwrap().is_none());

    let deny = AuthorizationCodeVerification::decide(&code, "alice", false, now).unwrap();
    bins.verifications.store(&deny).await.unwrap();

    // A second decision conflicts no matter what it says.
    let grant = AuthorizationCodeVerification::decide(&code, "alice", true, now).unwrap();
    assert_matches!(
        bins.verifications.store(&grant).await,
        Err(DbError::Conflict { .. })
    );
    assert_eq!(
        bins.verifications.find(&code.code).await.unwrap(),
        Some(deny)
    );
}

pub async fn authorization_tokens(bins: &Bins) {
    let now = now_millis();
    let code = AuthorizationCode::mint("app1", ["weight"], None, Duration::minutes(5), now).unwrap();
    let verification = AuthorizationCodeVerification::decide(&code, "alice", true, now).unwrap();
    let token = AuthorizationToken::issue(
        "app1",
        &code,
        Some(&verification),
        Duration::minutes(60),
        now,
    )
    .unwrap();
    bins.authorization_tokens.store(&token).await.unwrap();

    let mut clash = token.refresh(Duration::minutes(60), now);
    clash.access_token = token.access_token.clone();
    assert_matches!(
        bins.authorization_tokens.store(&clash).await,
        Err(DbError::Conflict { .. })
    );

    let mut clash = token.refresh(Duration::minutes(60), now);
    clash.refresh_token = token.refresh_token.clone();
    assert_matches!(
        bins.authorization_tokens.store(&clash).await,
        Err(DbError::Conflict { .. })
    );

    let live = bins
        .authorization_tokens
        .find_live_by_access_token(&token.access_token, now)
        .await
        .unwrap();
    assert_eq!(live, Some(token.clone()));
    assert!(bins
        .authorization_tokens
        .find_live_by_access_token(&token.access_token, token.expiration_time)
        .await
        .unwrap()
        .is_none());

    let by_refresh = bins
        .authorization_tokens
        .find_by_refresh_token(&token.refresh_token)
        .await
        .unwrap();
    assert_eq!(by_refresh, Some(token));
}

fn schema_record(id: &str, version: i64) -> SchemaRecord {
    SchemaRecord {
        id: id.to_string(),
        version,
        chunk_size: 10,
        time_authoritative: true,
        time_zone_authoritative: false,
        definition: json!({ "type": "object", "$comment": "stored as given" }),
    }
}

pub async fn schemas_page_in_order(bins: &Bins) {
    let id = format!("schema-{}", new_token());
    for version in [3, 1, 2] {
        bins.schemas.store(&schema_record(&id, version)).await.unwrap();
    }
    assert_matches!(
        bins.schemas.store(&schema_record(&id, 2)).await,
        Err(DbError::Conflict { entity: "schema", .. })
    );

    let query = |skip, limit| SchemaQuery {
        id: Some(id.clone()),
        version: None,
        page: PageRequest { skip, limit },
    };
    let first = bins.schemas.list(&query(0, 2)).await.unwrap();
    let second = bins.schemas.list(&query(2, 2)).await.unwrap();
    assert_eq!(first.total, 3);
    assert_eq!(second.total, 3);
    let versions: Vec<i64> = first
        .items
        .iter()
        .chain(second.items.iter())
        .map(|s| s.version)
        .collect();
    assert_eq!(versions, [1, 2, 3]);

    let exact = bins
        .schemas
        .list(&SchemaQuery {
            id: Some(id.clone()),
            version: Some(2),
            page: PageRequest::default(),
        })
        .await
        .unwrap();
    assert_eq!(exact.total, 1);
    assert_eq!(exact.items[0], schema_record(&id, 2));

    assert_eq!(
        bins.schemas.find(&id, 3).await.unwrap(),
        Some(schema_record(&id, 3))
    );
    assert!(bins.schemas.find(&id, 4).await.unwrap().is_none());
}

pub async fn data_newest_first(bins: &Bins) {
    let owner = format!("owner-{}", new_token());
    let now = now_millis();
    let point = |label: &str, minutes_ago: Option<i64>| Data {
        owner: owner.clone(),
        schema_id: "weight".into(),
        schema_version: 1,
        meta_data: minutes_ago.map(|m| MetaData {
            id: Some(label.to_string()),
            timestamp: Some(now - Duration::minutes(m)),
        }),
        data: json!({ "label": label }),
    };

    bins.data
        .store_all(&[point("old", Some(10)), point("undated", None), point("new", Some(1))])
        .await
        .unwrap();
    bins.data.store_all(&[point("undated-later", None)]).await.unwrap();

    let query = |skip, limit| DataQuery {
        owner: owner.clone(),
        schema_id: "weight".into(),
        schema_version: 1,
        page: PageRequest { skip, limit },
    };
    let all = bins.data.query(&query(0, 10)).await.unwrap();
    assert_eq!(all.total, 4);
    let labels: Vec<&str> = all
        .items
        .iter()
        .map(|d| d.data["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, ["new", "old", "undated-later", "undated"]);
    assert_eq!(all.items[0].meta_data.as_ref().unwrap().id.as_deref(), Some("new"));
    assert!(all.items[3].meta_data.is_none());

    let page = bins.data.query(&query(1, 2)).await.unwrap();
    assert_eq!(page.total, 4);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].data["label"], "old");

    let other_version = DataQuery {
        schema_version: 2,
        ..query(0, 10)
    };
    assert_eq!(bins.data.query(&other_version).await.unwrap().total, 0);
}

pub async fn health(bins: &Bins) {
    bins.health.ping().await.unwrap();
    assert!(!bins.health.engine().is_empty());
}
