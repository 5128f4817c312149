//! Pagination arithmetic shared by both entity stores
//!
//! Pages are 1-indexed. A page past the end is an empty page, never an error.

use serde::{Deserialize, Serialize};

/// Default page size when the caller supplies none
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size a caller may request
pub const MAX_PAGE_SIZE: usize = 100;

/// A sanitized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: usize,
    /// Items per page, within [1, MAX_PAGE_SIZE]
    pub page_size: usize,
}

impl PageRequest {
    /// Build a request, clamping `page` to >= 1 and `page_size` into [1, MAX_PAGE_SIZE]
    ///
    /// # Examples
    /// ```
    /// use shici_common::pagination::PageRequest;
    ///
    /// let p = PageRequest::new(0, 500);
    /// assert_eq!(p.page, 1);
    /// assert_eq!(p.page_size, 100);
    /// ```
    pub fn new(page: i64, page_size: i64) -> Self {
        let page = page.max(1) as usize;
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE as i64) as usize;
        Self { page, page_size }
    }

    /// Offset of the first item on this page
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.page_size)
    }

    /// `offset()` as an SQL OFFSET, or `None` when it does not fit in `i64`
    ///
    /// A page that far out is past the end of any result set.
    pub fn sql_offset(&self) -> Option<i64> {
        i64::try_from(self.offset()).ok()
    }

    /// Slice bounds `[start, end)` into a result set of `total` items
    ///
    /// Both bounds are clamped into `[0, total]`.
    pub fn bounds(&self, total: usize) -> (usize, usize) {
        let start = self.offset().min(total);
        let end = start.saturating_add(self.page_size).min(total);
        (start, end)
    }

    /// Number of pages needed for `total` items
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.page_size)
    }

    /// Wrap one page of items with its metadata
    pub fn page_of<T>(&self, items: Vec<T>, total: usize) -> Page<T> {
        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages(total),
        }
    }

    /// Cut this page out of a fully materialized result set
    pub fn slice<T: Clone>(&self, all: &[T]) -> Page<T> {
        let (start, end) = self.bounds(all.len());
        self.page_of(all[start..end].to_vec(), all.len())
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// An empty page for a request that matched nothing
    pub fn empty(request: PageRequest) -> Self {
        request.page_of(Vec::new(), 0)
    }
}
