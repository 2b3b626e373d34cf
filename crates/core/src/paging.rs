//! Paging parameters and paged results.

use serde::Serialize;

use crate::error::CoreError;

/// Default page size when the caller gives none.
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// A validated `(skip, limit)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Build from optional caller-supplied values.
    ///
    /// Requests above `max` are rejected rather than truncated, so a caller
    /// never receives a silently shortened page.
    pub fn from_params(
        skip: Option<i64>,
        limit: Option<i64>,
        default_limit: i64,
        max_limit: i64,
    ) -> Result<Self, CoreError> {
        let skip = skip.unwrap_or(0);
        if skip < 0 {
            return Err(CoreError::Validation(format!(
                "num_to_skip must not be negative, got {skip}"
            )));
        }
        let limit = limit.unwrap_or(default_limit.min(max_limit));
        if limit <= 0 {
            return Err(CoreError::Validation(format!(
                "num_to_return must be positive, got {limit}"
            )));
        }
        if limit > max_limit {
            return Err(CoreError::Validation(format!(
                "num_to_return must be at most {max_limit}, got {limit}"
            )));
        }
        Ok(Self { skip, limit })
    }

    /// Apply this request to an already-sorted in-memory sequence.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results plus the number of matches before paging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_apply() {
        let req = PageRequest::from_params(None, None, 100, 100).unwrap();
        assert_eq!(req, PageRequest { skip: 0, limit: 100 });
    }

    #[test]
    fn default_never_exceeds_cap() {
        let req = PageRequest::from_params(None, None, 500, 50).unwrap();
        assert_eq!(req.limit, 50);
    }

    #[test]
    fn over_cap_rejected() {
        assert_matches!(
            PageRequest::from_params(Some(0), Some(101), 100, 100),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn negative_skip_and_zero_limit_rejected() {
        assert_matches!(
            PageRequest::from_params(Some(-1), None, 100, 100),
            Err(CoreError::Validation(_))
        );
        assert_matches!(
            PageRequest::from_params(None, Some(0), 100, 100),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn slice_pages_are_disjoint() {
        let items = vec![1, 2, 3];
        let first = PageRequest { skip: 0, limit: 2 };
        let second = PageRequest { skip: 2, limit: 2 };
        assert_eq!(first.slice(items.clone()), vec![1, 2]);
        assert_eq!(second.slice(items), vec![3]);
    }
}
