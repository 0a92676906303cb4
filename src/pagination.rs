//! Query parameters of `GET /api/files`.

use serde::Deserialize;

use crate::config::DEFAULT_PAGE_SIZE;

/// Url parameters for pagination, either `skip`/`limit` or `page`/`limit`
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    /// Index offset in entries
    #[serde(alias = "offset")]
    pub skip: Option<usize>,
    /// 1-based page index, used when `skip` is absent
    pub page: Option<usize>,
    /// Maximum number of entries returned
    pub limit: Option<usize>,
}

/// Resolved `skip`/`limit` window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Entries to skip
    pub skip: usize,
    /// Entries to return, never zero
    pub limit: usize,
}

impl Pagination {
    /// Resolve the window, `None` for a zero limit
    #[must_use]
    pub fn window(&self) -> Option<Window> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if limit == 0 {
            return None;
        }
        let skip = match (self.skip, self.page) {
            (Some(skip), _) => skip,
            (None, page) => page.unwrap_or(1).max(1).saturating_sub(1).saturating_mul(limit),
        };
        Some(Window { skip, limit })
    }
}

impl Window {
    /// 1-based page the window starts in
    #[must_use]
    pub const fn current_page(&self) -> usize {
        (self.skip / self.limit).saturating_add(1)
    }

    /// Pages of `limit` entries in `total`
    #[must_use]
    pub const fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(skip: Option<usize>, page: Option<usize>, limit: Option<usize>) -> Option<Window> {
        Pagination { skip, page, limit }.window()
    }

    #[test]
    fn defaults() {
        assert_eq!(window(None, None, None), Some(Window { skip: 0, limit: 20 }));
    }

    #[test]
    fn skip_wins_over_page() {
        assert_eq!(window(Some(40), Some(9), Some(20)), Some(Window { skip: 40, limit: 20 }));
    }

    #[test]
    fn page_is_one_based() {
        assert_eq!(window(None, Some(3), Some(20)), Some(Window { skip: 40, limit: 20 }));
        assert_eq!(window(None, Some(0), Some(20)), Some(Window { skip: 0, limit: 20 }));
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert_eq!(window(Some(0), None, Some(0)), None);
    }

    #[test]
    fn page_counters() {
        let w = Window { skip: 60, limit: 20 };
        assert_eq!(w.current_page(), 4);
        assert_eq!(w.total_pages(67), 4);
        assert_eq!(w.total_pages(0), 0);
    }

    #[test]
    fn huge_skip_saturates() {
        let w = window(Some(usize::MAX), None, Some(1)).unwrap();
        assert_eq!(w.current_page(), usize::MAX);
        assert_eq!(w.total_pages(67), 67);
    }

    #[test]
    fn offset_alias() {
        let p: Pagination = serde_json::from_str(r#"{"offset":10,"limit":5}"#).unwrap();
        assert_eq!(p.window(), Some(Window { skip: 10, limit: 5 }));
    }
}
