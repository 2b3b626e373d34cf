//! Third-party client authentication.

use dsu_core::error::CoreError;
use dsu_core::third_party::ThirdParty;

use crate::error::AppResult;
use crate::state::AppState;

/// Resolve a third party by id and check its secret.
///
/// Unknown ids and wrong secrets fail the same way.
pub async fn authenticate_client(
    state: &AppState,
    client_id: &str,
    client_secret: &str,
) -> AppResult<ThirdParty> {
    let third_party = state
        .bins
        .third_parties
        .find(client_id)
        .await?
        .filter(|tp| tp.verify_secret(client_secret));

    match third_party {
        Some(tp) => Ok(tp),
        None => {
            tracing::warn!(client_id, "Third-party authentication failed");
            Err(CoreError::Unauthorized("Invalid client credentials".into()).into())
        }
    }
}
