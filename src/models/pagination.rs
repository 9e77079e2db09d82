// src/models/pagination.rs
// DOCUMENTATION: Shared pagination rules for listings and admin queues
// PURPOSE: One place for page/limit defaults, clamping and response metadata

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Highest page number accepted; keeps `page * limit` inside i64
pub const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Normalised page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    /// Page defaults to 1, limit to 20 and is clamped to 1..=100
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        PageParams {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageParams {
    fn default() -> Self {
        PageParams::new(None, None)
    }
}

/// Paginated response envelope
/// DOCUMENTATION: Returned by every list endpoint
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Items on this page
    pub data: Vec<T>,

    /// Total number of matches (regardless of pagination)
    pub total_count: i64,

    /// Current page number
    pub page: i64,

    /// Results per page
    pub limit: i64,

    /// Whether more results exist on next page
    pub has_more: bool,

    /// Number of pages for this limit
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total_count: i64, params: PageParams) -> Self {
        Paginated {
            data,
            total_count,
            page: params.page,
            limit: params.limit,
            has_more: total_count > params.page.saturating_mul(params.limit),
            total_pages: (total_count + params.limit - 1) / params.limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            limit: self.limit,
            has_more: self.has_more,
            total_pages: self.total_pages,
        }
    }
}

/// Apply the same paging rules to an already-fetched vector
pub fn paginate_slice<T>(items: Vec<T>, params: PageParams) -> Paginated<T> {
    let total = items.len() as i64;
    let data = items
        .into_iter()
        .skip(params.offset() as usize)
        .take(params.limit as usize)
        .collect();
    Paginated::new(data, total, params)
}
