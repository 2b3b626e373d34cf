//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. Paged listings add a
//! `metadata` object carrying the number of matches before paging.

use dsu_core::paging::Page;
use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "metadata": { "count": N } }` envelope for paged results.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub metadata: PageMetadata,
}

#[derive(Debug, Serialize)]
pub struct PageMetadata {
    pub count: u64,
}

impl<T: Serialize> From<Page<T>> for PagedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            data: page.items,
            metadata: PageMetadata { count: page.total },
        }
    }
}
