//! Pagination
//!
//! Public listings use 1-based page numbers with a fixed page size per
//! listing. Page numbers below 1 are clamped to 1.

use serde::Deserialize;

/// Users returned per page by the moderator listing
pub const USERS_PER_PAGE: i64 = 10;

/// Documents returned per page by public listings
pub const DOCUMENTS_PER_PAGE: i64 = 20;

/// A clamped 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page(i64);

impl Page {
    pub fn new(page: i64) -> Self {
        Self(page.max(1))
    }

    pub fn number(&self) -> i64 {
        self.0
    }

    /// SQL `LIMIT`/`OFFSET` pair for the given page size
    pub fn limit_offset(&self, page_size: i64) -> (i64, i64) {
        (page_size, (self.0 - 1).saturating_mul(page_size))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self(1)
    }
}

/// `?page=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        self.page.map(Page::new).unwrap_or_default()
    }
}
