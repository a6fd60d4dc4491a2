//! Result shapes returned by terminal calls

use super::pagination::{page_count, Pagination};
use crate::database::types::{Row, SqlValue};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Rows as ordered column maps
pub type Dataset = Vec<Row>;

/// Rows mapped into typed records
pub type Recordset<T> = Vec<T>;

/// One page of results plus the total across all pages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn page_count(&self) -> u64 {
        page_count(self.total, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// View model for pagination controls, `{0}` in the pattern is the page
    pub fn to_pagination(&self, url_pattern: impl Into<String>) -> Pagination {
        Pagination::new(self.total, self.page, self.page_size, url_pattern.into())
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Map one row into a typed record through its JSON form
pub fn map_row<T: DeserializeOwned>(row: &Row) -> Result<T> {
    Ok(serde_json::from_value(row.to_json())?)
}

/// Map every row into typed records
pub fn map_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Recordset<T>> {
    rows.iter().map(map_row).collect()
}

/// First column of the first row
pub fn scalar(row: Option<Row>) -> Option<SqlValue> {
    row.and_then(Row::into_first).filter(|v| !v.is_null())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Employee {
        id: i64,
        name: String,
        manager_id: Option<i64>,
    }

    fn employee_row(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.push("id", SqlValue::BigInt(id));
        row.push("name", SqlValue::from(name));
        row.push("manager_id", SqlValue::Null);
        row
    }

    #[test]
    fn test_map_rows() {
        let rows = vec![employee_row(1, "Nathalie"), employee_row(2, "Omar")];
        let employees: Recordset<Employee> = map_rows(&rows).unwrap();
        assert_eq!(
            employees[1],
            Employee {
                id: 2,
                name: "Omar".to_string(),
                manager_id: None
            }
        );
    }

    #[test]
    fn test_map_row_type_mismatch_is_json_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrong {
            id: String,
        }
        let err = map_row::<Wrong>(&employee_row(1, "x")).unwrap_err();
        assert!(matches!(err, crate::error::Error::Json(_)));
    }

    #[test]
    fn test_scalar_skips_null() {
        let mut row = Row::new();
        row.push("aggregate", SqlValue::Null);
        assert_eq!(scalar(Some(row)), None);
        assert_eq!(scalar(None), None);
    }

    #[test]
    fn test_page_helpers() {
        let page = Page {
            items: vec![1, 2, 3],
            total: 25,
            page: 3,
            page_size: 10,
        };
        assert_eq!(page.page_count(), 3);
        assert!(!page.has_next());
        assert!(page.has_prev());
        assert_eq!(page.to_pagination("/p/{0}").prev_url(), "/p/2");
        assert_eq!(page.map(|i| i * 2).items, vec![2, 4, 6]);
    }
}
