use serde::{Deserialize, Serialize};

/// A registered resource owner.
///
/// The password hash is an Argon2id PHC string and never leaves the process
/// in a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Public view of a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub username: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
        }
    }
}
