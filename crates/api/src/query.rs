//! Shared query parameter types for API handlers.

use dsu_core::paging::PageRequest;
use serde::Deserialize;

use crate::config::PagingConfig;
use crate::error::{AppError, AppResult};

/// Paging parameters (`?num_to_skip=&num_to_return=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub num_to_skip: Option<i64>,
    pub num_to_return: Option<i64>,
}

impl PaginationParams {
    /// Validate against the configured page sizes.
    pub fn page(&self, config: &PagingConfig) -> AppResult<PageRequest> {
        Ok(PageRequest::from_params(
            self.num_to_skip,
            self.num_to_return,
            config.default_page_size,
            config.max_page_size,
        )?)
    }
}

/// Collect every value of a repeatable query parameter.
///
/// `serde_urlencoded` keeps repeated keys when asked for a list of pairs,
/// which a plain struct cannot express.
pub fn repeated(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
        .collect()
}

/// First value of a query parameter, if any.
pub fn first(pairs: &[(String, String)], name: &str) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.clone())
}

/// First value of a query parameter parsed as an integer.
pub fn parse_i64(pairs: &[(String, String)], name: &str) -> AppResult<Option<i64>> {
    first(pairs, name)
        .map(|value| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest(format!("{name} must be an integer")))
        })
        .transpose()
}
