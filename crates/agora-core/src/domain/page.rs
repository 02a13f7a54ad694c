//! Page-number pagination shared by post and comment listings.

use serde::Serialize;

use crate::error::DomainError;

/// Storage engines bind offsets as signed 64-bit integers.
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A validated, 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u64,
    page_size: u64,
}

impl Pagination {
    /// Validate raw caller input. Zero and negative values are rejected.
    pub fn new(page: i64, page_size: i64) -> Result<Self, DomainError> {
        if page < 1 {
            return Err(DomainError::invalid("page must be greater than 0"));
        }
        if page_size < 1 {
            return Err(DomainError::invalid("page size must be greater than 0"));
        }
        Ok(Self {
            page: page as u64,
            page_size: page_size as u64,
        })
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Rows to skip. Pages past the addressable range clamp to the largest
    /// offset, which yields an empty page rather than an error.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .checked_mul(self.page_size)
            .map_or(MAX_OFFSET, |offset| offset.min(MAX_OFFSET))
    }
}

/// One page of results plus totals computed over the whole filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, pagination: Pagination) -> Self {
        Self {
            items,
            total_count,
            total_pages: total_count.div_ceil(pagination.page_size),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            total_pages: self.total_pages,
        }
    }
}
