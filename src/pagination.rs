//! This module defines the common functionality for paging ledger data.

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of rows to return per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 50,
        }
    }
}

impl PaginationConfig {
    /// Turn the optional `page` and `page_size` query parameters into a SQL
    /// `LIMIT` and `OFFSET` pair.
    ///
    /// Pages are one-based. A page of zero is treated as the first page, and
    /// the offset arithmetic saturates since both values come straight from
    /// the query string.
    pub fn to_limit_offset(&self, page: Option<u64>, page_size: Option<u64>) -> (u64, u64) {
        let page = page.unwrap_or(self.default_page);
        let limit = page_size.unwrap_or(self.default_page_size);
        let offset = page.saturating_sub(1).saturating_mul(limit);

        (limit, offset)
    }
}
