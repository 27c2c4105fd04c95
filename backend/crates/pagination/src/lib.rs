//! Page and envelope primitives shared by list endpoints.
//!
//! Listings validate a [`PageRequest`] and return [`Paginated`] envelopes.

use serde::{Deserialize, Serialize};

/// Default page size applied when the caller omits `limit`.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Errors raised when validating page parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PageError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    PageOutOfRange,
    /// Limit must fall in `1..=MAX_LIMIT`.
    #[error("limit must be between 1 and {max}")]
    LimitOutOfRange {
        /// Upper bound accepted for `limit`.
        max: u32,
    },
}

/// Validated one-based page request.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let page = PageRequest::new(Some(3), Some(10)).expect("valid page");
/// assert_eq!(page.offset(), 20);
/// assert_eq!(page.limit(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl PageRequest {
    /// Validate optional raw `page`/`limit` values, applying defaults.
    ///
    /// # Errors
    /// Returns [`PageError`] when either value is zero or the limit exceeds
    /// [`MAX_LIMIT`].
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Result<Self, PageError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(PageError::PageOutOfRange);
        }
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit == 0 || limit > MAX_LIMIT {
            return Err(PageError::LimitOutOfRange { max: MAX_LIMIT });
        }
        Ok(Self { page, limit })
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of items on this page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip before this page starts.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Page of items plus the totals a client needs to render pagers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on the current page.
    pub items: Vec<T>,
    /// One-based page number.
    pub page: u32,
    /// Page size used for the query.
    pub limit: u32,
    /// Total number of matching items across all pages.
    pub total: u64,
    /// Total number of pages for `total` at `limit`.
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    /// Build an envelope for `items` returned by `request`.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageRequest, Paginated};
    ///
    /// let request = PageRequest::new(Some(1), Some(2)).expect("valid page");
    /// let page = Paginated::new(vec!["a", "b"], request, 5);
    /// assert_eq!(page.total_pages, 3);
    /// ```
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page(),
            limit: request.limit(),
            total,
            total_pages: total.div_ceil(u64::from(request.limit())),
        }
    }

    /// Transform each item while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}
