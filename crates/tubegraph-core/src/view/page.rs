//! Pagination with lenient coercion of caller input.

use serde::{Deserialize, Serialize};
use crate::constants::{DEFAULT_LIMIT, DEFAULT_PAGE};

/// A page request. Both fields are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    page: u64,
    limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl Page {
    /// Build from numeric input; zero or negative values fall back to the defaults
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: if page > 0 { page as u64 } else { DEFAULT_PAGE },
            limit: if limit > 0 { limit as u64 } else { DEFAULT_LIMIT },
        }
    }

    /// Build from raw query-string input; missing or non-numeric values fall back to the defaults
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(0);
        Self::new(parse(page), parse(limit))
    }

    /// 1-based page number
    pub fn page(&self) -> u64 {
        self.page
    }

    /// Rows per page
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Rows skipped before this page: `(page - 1) * limit`
    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_non_positive_values_coerce_to_defaults() {
        let page = Page::new(0, -5);
        assert_eq!(page.page(), 1);
        assert_eq!(page.limit(), 10);
        assert_eq!(page.skip(), 0);
    }

    #[test]
    fn test_raw_input_coercion() {
        assert_eq!(Page::from_raw(Some("3"), Some("20")), Page::new(3, 20));
        assert_eq!(Page::from_raw(Some("abc"), Some("")), Page::default());
        assert_eq!(Page::from_raw(None, Some("-1")), Page::default());
        assert_eq!(Page::from_raw(Some(" 2 "), None).page(), 2);
        assert_eq!(Page::from_raw(Some("2.5"), None).page(), 1);
    }

    #[test]
    fn test_skip_saturates() {
        let page = Page::new(i64::MAX, i64::MAX);
        assert_eq!(page.skip(), u64::MAX);
    }

    proptest! {
        #[test]
        fn skip_is_page_minus_one_times_limit(page in -1000i64..1000, limit in -1000i64..1000) {
            let p = Page::new(page, limit);
            let expected_page = if page <= 0 { 1 } else { page as u64 };
            let expected_limit = if limit <= 0 { 10 } else { limit as u64 };
            prop_assert_eq!(p.page(), expected_page);
            prop_assert_eq!(p.limit(), expected_limit);
            prop_assert_eq!(p.skip(), (expected_page - 1) * expected_limit);
        }

        #[test]
        fn raw_garbage_never_panics(page in ".*", limit in ".*") {
            let p = Page::from_raw(Some(&page), Some(&limit));
            prop_assert!(p.page() >= 1);
            prop_assert!(p.limit() >= 1);
        }
    }
}
