//! Third-party applications that request delegated access.

use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::error::CoreError;
use crate::types::new_token;

/// Maximum length of a third-party display name.
pub const MAX_NAME_LENGTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdParty {
    /// Username of the user who registered the application.
    pub owner: String,
    pub id: String,
    pub secret: String,
    pub name: String,
    pub description: Option<String>,
    pub redirect_uri: String,
}

/// Registration input for a third party.
#[derive(Debug, Clone, Deserialize)]
pub struct NewThirdParty {
    pub name: String,
    pub description: Option<String>,
    pub redirect_uri: String,
}

impl ThirdParty {
    /// Mint a new third party with fresh id and secret.
    pub fn register(owner: &str, input: NewThirdParty) -> Result<Self, CoreError> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Third-party name must not be empty".into()));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(CoreError::Validation(format!(
                "Third-party name must be at most {MAX_NAME_LENGTH} characters long"
            )));
        }
        let redirect_uri = url::Url::parse(input.redirect_uri.trim())
            .map_err(|e| CoreError::Validation(format!("Invalid redirect URI: {e}")))?;

        Ok(Self {
            owner: owner.to_string(),
            id: new_token(),
            secret: new_token(),
            name: name.to_string(),
            description: input
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            redirect_uri: redirect_uri.to_string(),
        })
    }

    /// Constant-time comparison of the presented secret.
    pub fn verify_secret(&self, presented: &str) -> bool {
        self.secret.as_bytes().ct_eq(presented.as_bytes()).into()
    }
}

/// A third party as shown to its owner after registration (no secret).
#[derive(Debug, Clone, Serialize)]
pub struct ThirdPartyInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub redirect_uri: String,
}

impl From<&ThirdParty> for ThirdPartyInfo {
    fn from(tp: &ThirdParty) -> Self {
        Self {
            id: tp.id.clone(),
            name: tp.name.clone(),
            description: tp.description.clone(),
            redirect_uri: tp.redirect_uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn input(name: &str, uri: &str) -> NewThirdParty {
        NewThirdParty {
            name: name.into(),
            description: Some("  ".into()),
            redirect_uri: uri.into(),
        }
    }

    #[test]
    fn register_mints_distinct_credentials() {
        let tp = ThirdParty::register("alice", input(" app1 ", "https://app1.example/cb")).unwrap();
        assert_eq!(tp.owner, "alice");
        assert_eq!(tp.name, "app1");
        assert_ne!(tp.id, tp.secret);
        assert!(tp.description.is_none());
        assert_eq!(tp.redirect_uri, "https://app1.example/cb");
    }

    #[test]
    fn register_rejects_bad_input() {
        assert_matches!(
            ThirdParty::register("alice", input("", "https://x.example")),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            ThirdParty::register("alice", input("app", "not a url")),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn secret_check() {
        let tp = ThirdParty::register("alice", input("app", "https://x.example")).unwrap();
        let secret = tp.secret.clone();
        assert!(tp.verify_secret(&secret));
        assert!(!tp.verify_secret("wrong"));
        assert!(!tp.verify_secret(""));

        // Same length, one byte off.
        let mut near = secret.clone().into_bytes();
        near[0] ^= 1;
        assert!(!tp.verify_secret(std::str::from_utf8(&near).unwrap()));
        assert!(!tp.verify_secret(&format!("{secret}x")));
    }

    #[test]
    fn info_omits_secret() {
        let tp = ThirdParty::register("alice", input("app", "https://x.example")).unwrap();
        let json = serde_json::to_value(ThirdPartyInfo::from(&tp)).unwrap();
        assert!(json.get("secret").is_none());
        assert_eq!(json["id"], tp.id.as_str());
    }
}
