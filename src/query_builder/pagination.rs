use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Default page size when none is requested
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Page selection as received from a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self { page, page_size }
    }

    /// Read `page` and `limit` / `per_page` / `page_size` from query parameters
    ///
    /// Missing or malformed values fall back to the defaults.
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let parse = |key: &str| {
            params
                .get(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        Self {
            page: parse("page").unwrap_or(defaults.page),
            page_size: parse("limit")
                .or_else(|| parse("per_page"))
                .or_else(|| parse("page_size"))
                .unwrap_or(defaults.page_size),
        }
    }

    /// Zero-based offset of the first row
    pub fn offset(&self) -> u64 {
        self.page.max(1).saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// View model for rendering pagination controls
#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub items: i64,          // Total number of items
    pub page: u64,           // Current page (1-based)
    pub count: u64,          // Total pages
    pub per_page: u64,       // Items per page
    pub url_pattern: String, // URL pattern with {0} placeholder
}

impl Pagination {
    pub fn new(total: i64, page: u64, per_page: u64, url_pattern: String) -> Self {
        let count = page_count(total, per_page);
        Self {
            items: total,
            page: page.max(1),
            count,
            per_page,
            url_pattern,
        }
    }

    pub fn is_first(&self) -> bool {
        self.page == 1
    }
    pub fn is_last(&self) -> bool {
        self.page >= self.count
    }
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
    pub fn has_next(&self) -> bool {
        self.page < self.count
    }

    fn url(&self, page: u64) -> String {
        self.url_pattern.replace("{0}", &page.to_string())
    }

    pub fn first_url(&self) -> String {
        self.url(1)
    }

    pub fn last_url(&self) -> String {
        self.url(self.count.max(1))
    }

    pub fn prev_url(&self) -> String {
        if self.has_prev() {
            self.url(self.page - 1)
        } else {
            "#".to_string()
        }
    }

    pub fn next_url(&self) -> String {
        if self.has_next() {
            self.url(self.page + 1)
        } else {
            "#".to_string()
        }
    }

    /// Up to `max_items` page links around the current page
    pub fn range(&self, max_items: usize) -> Vec<Value> {
        if max_items == 0 || self.count == 0 {
            return Vec::new();
        }
        let start = if self.page <= 3 { 1 } else { self.page - 2 };
        let end = (start + max_items as u64 - 1).min(self.count);

        (start..=end)
            .map(|i| {
                json!({
                    "page": i,
                    "url": self.url(i),
                    "selected": i == self.page
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "items": self.items,
            "page": self.page,
            "count": self.count,
            "per_page": self.per_page,
            "isFirst": self.is_first(),
            "isLast": self.is_last(),
            "hasPrev": self.has_prev(),
            "hasNext": self.has_next(),
            "first": { "url": self.first_url() },
            "last": { "url": self.last_url() },
            "prev": { "url": self.prev_url() },
            "next": { "url": self.next_url() },
            "range": self.range(7)
        })
    }
}

/// Number of pages needed for `total` rows
pub fn page_count(total: i64, per_page: u64) -> u64 {
    if total <= 0 || per_page == 0 {
        return 0;
    }
    (total as u64).div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_from_params() {
        let mut params = HashMap::new();
        params.insert("page".to_string(), "3".to_string());
        params.insert("per_page".to_string(), "15".to_string());
        assert_eq!(PageRequest::from_params(&params), PageRequest::new(3, 15));

        params.insert("limit".to_string(), "50".to_string());
        assert_eq!(PageRequest::from_params(&params).page_size, 50);

        let mut bad = HashMap::new();
        bad.insert("page".to_string(), "zero".to_string());
        bad.insert("limit".to_string(), "0".to_string());
        assert_eq!(PageRequest::from_params(&bad), PageRequest::default());
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(0, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
    }

    #[test]
    fn test_pagination_links() {
        let pagination = Pagination::new(25, 2, 10, "/employees?page={0}".to_string());
        assert_eq!(pagination.count, 3);
        assert!(pagination.has_prev());
        assert!(pagination.has_next());
        assert_eq!(pagination.prev_url(), "/employees?page=1");
        assert_eq!(pagination.next_url(), "/employees?page=3");
        assert_eq!(pagination.range(7).len(), 3);

        let json = pagination.to_json();
        assert_eq!(json["last"]["url"], "/employees?page=3");
        assert_eq!(json["isFirst"], false);
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 0);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 0);
    }
}
