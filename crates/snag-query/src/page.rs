//! Pagination parameters and the paged result envelope.

use serde::{Deserialize, Serialize};

/// Default page size.
pub const DEFAULT_LIMIT: i64 = 20;
/// Smallest accepted page size.
pub const MIN_LIMIT: i64 = 1;
/// Largest accepted page size.
pub const MAX_LIMIT: i64 = 100;

/// Validated pagination window.
///
/// This is the one place in the composer where inputs default instead of
/// failing: pagination noise (a missing value, a stray non-numeric string)
/// degrades to the default window rather than rejecting the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl Page {
    /// Build a window from raw query values.
    ///
    /// Non-numeric or missing values fall back to the defaults; `limit`
    /// clamps to 1..=100 and `offset` to >= 0. Never fails.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = parse_or(limit, DEFAULT_LIMIT).clamp(MIN_LIMIT, MAX_LIMIT);
        let offset = parse_or(offset, 0).max(0);
        Self { limit, offset }
    }
}

fn parse_or(raw: Option<&str>, default: i64) -> i64 {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// A page of items plus the total matching count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Paged<T> {
    pub fn new(items: Vec<T>, total: i64) -> Self {
        Self { items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let page = Page::from_raw(None, None);
        assert_eq!(page, Page { limit: 20, offset: 0 });
    }

    #[test]
    fn test_limit_clamps_to_range() {
        assert_eq!(Page::from_raw(Some("0"), None).limit, 1);
        assert_eq!(Page::from_raw(Some("-5"), None).limit, 1);
        assert_eq!(Page::from_raw(Some("100"), None).limit, 100);
        assert_eq!(Page::from_raw(Some("500"), None).limit, 100);
        assert_eq!(Page::from_raw(Some("37"), None).limit, 37);
    }

    #[test]
    fn test_offset_clamps_to_zero() {
        assert_eq!(Page::from_raw(None, Some("-1")).offset, 0);
        assert_eq!(Page::from_raw(None, Some("40")).offset, 40);
    }

    #[test]
    fn test_non_numeric_falls_back_to_default() {
        let page = Page::from_raw(Some("abc"), Some("1.5"));
        assert_eq!(page, Page::default());
    }

    #[test]
    fn test_blank_falls_back_to_default() {
        let page = Page::from_raw(Some("  "), Some(""));
        assert_eq!(page, Page::default());
    }
}
