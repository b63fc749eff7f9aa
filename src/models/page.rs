use serde::Serialize;

use crate::error::{AppError, AppResult};

/// One page of a listing, shaped the way the frontend paginator expects
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// 1-based page request; `limit` falls back to the configured page size
/// and never exceeds the configured maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        let max_limit = max_limit.max(1);
        Self {
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(default_limit)
                .clamp(1, max_limit),
        }
    }

    /// Rows to skip; a page so far out that the offset leaves the SQL
    /// integer range is rejected
    pub fn offset(&self) -> AppResult<u64> {
        (self.page - 1)
            .checked_mul(self.limit)
            .filter(|offset| i64::try_from(*offset).is_ok())
            .ok_or_else(|| AppError::validation("page", "Invalid page."))
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        if total_count == 0 {
            0
        } else {
            total_count.div_ceil(self.limit)
        }
    }
}

impl<T> Page<T> {
    /// Wraps `results` and builds `next`/`previous` links against `base_url`
    /// (path plus any filter query string, without `page`/`limit`)
    pub fn new(results: Vec<T>, count: u64, request: PageRequest, base_url: &str) -> Self {
        let link = |page: u64| {
            let separator = if base_url.contains('?') { '&' } else { '?' };
            format!("{base_url}{separator}page={page}&limit={}", request.limit)
        };

        let next = (request.page < request.total_pages(count)).then(|| link(request.page + 1));
        let previous = (request.page > 1).then(|| link(request.page - 1));

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_falls_back_to_defaults() {
        let req = PageRequest::new(None, Some(0), 6, 100);
        assert_eq!(req, PageRequest { page: 1, limit: 6 });
        assert_eq!(req.offset().expect("offset"), 0);
    }

    #[test]
    fn limit_is_capped() {
        let req = PageRequest::new(Some(3), Some(u64::MAX), 6, 50);
        assert_eq!(req.limit, 50);
        assert_eq!(req.offset().expect("offset"), 100);
    }

    #[test]
    fn out_of_range_page_is_a_validation_error() {
        let overflow = PageRequest::new(Some(u64::MAX), Some(2), 6, 100);
        assert!(matches!(
            overflow.offset(),
            Err(AppError::ValidationFailed { ref field, .. }) if field == "page"
        ));

        let too_far = PageRequest::new(Some(i64::MAX as u64), Some(4), 6, 100);
        assert!(too_far.offset().is_err());
    }

    #[test]
    fn links_are_only_present_when_pages_exist() {
        let req = PageRequest::new(Some(2), Some(2), 6, 100);
        let page = Page::new(vec![3, 4], 5, req, "/api/recipes/?author=1");

        assert_eq!(page.count, 5);
        assert_eq!(page.next.as_deref(), Some("/api/recipes/?author=1&page=3&limit=2"));
        assert_eq!(page.previous.as_deref(), Some("/api/recipes/?author=1&page=1&limit=2"));

        let last = Page::new(vec![5], 5, PageRequest::new(Some(3), Some(2), 6, 100), "/api/users/");
        assert!(last.next.is_none());
        assert_eq!(last.previous.as_deref(), Some("/api/users/?page=2&limit=2"));
    }
}
