//! Delegated authorization: codes, owner decisions and access tokens.
//!
//! The lifecycle of one grant:
//!
//! 1. a third party mints an [`AuthorizationCode`] naming the schema ids it
//!    wants to read;
//! 2. the resource owner records exactly one
//!    [`AuthorizationCodeVerification`] (grant or deny) for that code;
//! 3. while the verification grants access, the third party exchanges the
//!    code for an [`AuthorizationToken`];
//! 4. the token can be refreshed, producing a new token that points at the
//!    same code.
//!
//! Tokens do not copy scopes or the grantor. Both are re-derived through
//! `token -> code -> verification` on every access check.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{new_token, Lifetime, Timestamp};
use crate::validation::validate_scopes;

/// Default lifetime of an authorization code.
pub const DEFAULT_CODE_LIFETIME_MINS: i64 = 5;

/// Default lifetime of an authorization token.
pub const DEFAULT_TOKEN_LIFETIME_MINS: i64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub third_party_id: String,
    pub code: String,
    pub creation_time: Timestamp,
    pub expiration_time: Timestamp,
    pub scopes: BTreeSet<String>,
    pub state: Option<String>,
}

impl AuthorizationCode {
    /// Mint a code for `third_party_id`. Fails on an empty scope set.
    pub fn mint<I, S>(
        third_party_id: &str,
        scopes: I,
        state: Option<String>,
        lifetime: Lifetime,
        now: Timestamp,
    ) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let scopes = validate_scopes(scopes)?;
        Ok(Self {
            third_party_id: third_party_id.to_string(),
            code: new_token(),
            creation_time: now,
            expiration_time: now + lifetime,
            scopes,
            state,
        })
    }

    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expiration_time <= now
    }

    pub fn covers(&self, schema_id: &str) -> bool {
        self.scopes.contains(schema_id)
    }
}

/// The resource owner's single decision on a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCodeVerification {
    pub authorization_code: String,
    pub owner: String,
    pub granted: bool,
}

impl AuthorizationCodeVerification {
    /// Record `owner`'s decision on `code`. Expired codes cannot be decided.
    ///
    /// Uniqueness of the decision is enforced by storage, not here.
    pub fn decide(
        code: &AuthorizationCode,
        owner: &str,
        granted: bool,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if code.is_expired(now) {
            return Err(CoreError::Validation(
                "Authorization code has expired".into(),
            ));
        }
        Ok(Self {
            authorization_code: code.code.clone(),
            owner: owner.to_string(),
            granted,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationToken {
    pub authorization_code: String,
    pub access_token: String,
    pub refresh_token: String,
    pub creation_time: Timestamp,
    pub expiration_time: Timestamp,
}

impl AuthorizationToken {
    /// Exchange a code for a token.
    ///
    /// `presenter` is the authenticated third party asking for the token; it
    /// must be the one the code was minted for. The code must be unexpired and
    /// needs a verification that grants access.
    pub fn issue(
        presenter: &str,
        code: &AuthorizationCode,
        verification: Option<&AuthorizationCodeVerification>,
        lifetime: Lifetime,
        now: Timestamp,
    ) -> Result<Self, CoreError> {
        if code.third_party_id != presenter {
            return Err(CoreError::Forbidden(
                "Authorization code was issued to another third party".into(),
            ));
        }
        if code.is_expired(now) {
            return Err(CoreError::Validation(
                "Authorization code has expired".into(),
            ));
        }
        let verification = verification
            .filter(|v| v.authorization_code == code.code)
            .ok_or_else(|| {
                CoreError::Validation("Authorization code has not been verified".into())
            })?;
        if !verification.granted {
            return Err(CoreError::Forbidden(
                "The resource owner denied this authorization code".into(),
            ));
        }
        Ok(Self::for_code(&code.code, lifetime, now))
    }

    /// A fresh token for the same code. The receiver stays valid.
    pub fn refresh(&self, lifetime: Lifetime, now: Timestamp) -> Self {
        Self::for_code(&self.authorization_code, lifetime, now)
    }

    fn for_code(code: &str, lifetime: Lifetime, now: Timestamp) -> Self {
        Self {
            authorization_code: code.to_string(),
            access_token: new_token(),
            refresh_token: new_token(),
            creation_time: now,
            expiration_time: now + lifetime,
        }
    }

    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expiration_time > now
    }
}

/// Decide whether a third party holding `token` may read `owner`'s data
/// stored under `schema_id`.
///
/// Callers resolve the chain `token -> code -> verification` from storage and
/// pass whatever they found; any missing link denies access.
pub fn check_access(
    token: Option<&AuthorizationToken>,
    code: Option<&AuthorizationCode>,
    verification: Option<&AuthorizationCodeVerification>,
    schema_id: &str,
    owner: &str,
    now: Timestamp,
) -> Result<(), CoreError> {
    let denied = |reason: &str| Err(CoreError::Forbidden(reason.to_string()));

    let Some(token) = token.filter(|t| t.is_live(now)) else {
        return denied("Authorization token is missing or expired");
    };
    let Some(code) = code.filter(|c| c.code == token.authorization_code) else {
        return denied("Authorization token has no authorization code");
    };
    let Some(verification) = verification.filter(|v| v.authorization_code == code.code) else {
        return denied("Authorization code was never verified");
    };
    if !verification.granted {
        return denied("Authorization was denied by the resource owner");
    }
    if !code.covers(schema_id) {
        return denied("Authorization does not cover this schema");
    }
    if verification.owner != owner {
        return denied("Authorization was granted by a different user");
    }
    Ok(())
}
