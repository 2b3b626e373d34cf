use serde::{Deserialize, Serialize};

use crate::types::{new_token, now_millis, Lifetime, Timestamp};

/// Default lifetime of an authentication token.
pub const DEFAULT_LIFETIME_MINS: i64 = 30;

/// A login session. One is minted per successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationToken {
    pub token: String,
    pub username: String,
    pub granted: Timestamp,
    pub expires: Timestamp,
}

impl AuthenticationToken {
    pub fn mint(username: &str, lifetime: Lifetime) -> Self {
        Self::mint_at(username, now_millis(), lifetime)
    }

    pub fn mint_at(username: &str, granted: Timestamp, lifetime: Lifetime) -> Self {
        Self {
            token: new_token(),
            username: username.to_string(),
            granted,
            expires: granted + lifetime,
        }
    }

    /// Live while `expires` is strictly after `now`.
    pub fn is_live(&self, now: Timestamp) -> bool {
        self.expires > now
    }
}
