//! Low-level driver primitive
//!
//! A driver runs already-compiled SQL with bound parameters and knows its
//! engine's literal escaping rules. Everything above it (platform,
//! diagnostics, timeouts, error reporting) lives in [`Connection`].
//!
//! [`Connection`]: crate::database::Connection

use crate::database::types::{Row, SqlValue};
use crate::error::Result;
use async_trait::async_trait;

/// Result of a statement that modifies data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Number of rows affected by the query
    pub rows_affected: u64,
    /// Last inserted ID (if applicable)
    pub last_insert_id: Option<i64>,
}

/// Database driver
///
/// Failures are reported as [`Error::Driver`](crate::error::Error::Driver);
/// the connection attaches the SQL text.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Get the name of this driver
    fn name(&self) -> &str;

    /// Escape a string for inclusion inside a quoted literal
    fn escape(&self, value: &str) -> String;

    /// Render a value as a SQL literal
    ///
    /// Only used to interpolate SQL for display; queries are always sent
    /// with bound parameters.
    fn quote(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            SqlValue::TinyInt(_)
            | SqlValue::SmallInt(_)
            | SqlValue::Int(_)
            | SqlValue::BigInt(_)
            | SqlValue::UnsignedTinyInt(_)
            | SqlValue::UnsignedSmallInt(_)
            | SqlValue::UnsignedInt(_)
            | SqlValue::UnsignedBigInt(_)
            | SqlValue::Float(_)
            | SqlValue::Double(_)
            | SqlValue::Decimal(_)
            | SqlValue::Timestamp(_) => value.to_string(),
            SqlValue::Bytes(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                format!("X'{}'", hex)
            }
            SqlValue::List(values) => {
                let items: Vec<String> = values.iter().map(|v| self.quote(v)).collect();
                format!("({})", items.join(", "))
            }
            other => format!("'{}'", self.escape(&other.to_string())),
        }
    }

    /// Test database connectivity
    async fn ping(&self) -> Result<bool>;

    /// Execute a query that modifies data (INSERT, UPDATE, DELETE)
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult>;

    /// Fetch all rows from a SELECT query
    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>>;

    /// Fetch the first row, if any
    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>> {
        Ok(self.fetch_all(sql, params).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LiteralOnly;

    #[async_trait]
    impl Driver for LiteralOnly {
        fn name(&self) -> &str {
            "literal"
        }

        fn escape(&self, value: &str) -> String {
            value.replace('\'', "''")
        }

        async fn ping(&self) -> Result<bool> {
            Ok(true)
        }

        async fn execute(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<QueryResult> {
            Ok(QueryResult::default())
        }

        async fn fetch_all(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_default_quote() {
        let driver = LiteralOnly;
        assert_eq!(driver.quote(&SqlValue::Null), "NULL");
        assert_eq!(driver.quote(&SqlValue::Bool(true)), "1");
        assert_eq!(driver.quote(&SqlValue::BigInt(-4)), "-4");
        assert_eq!(driver.quote(&SqlValue::from("O'Brien")), "'O''Brien'");
        assert_eq!(driver.quote(&SqlValue::Bytes(vec![0xde, 0xad])), "X'DEAD'");
        assert_eq!(
            driver.quote(&SqlValue::List(vec![1.into(), "a".into()])),
            "(1, 'a')"
        );
    }

    #[tokio::test]
    async fn test_fetch_one_defaults_to_first_row() {
        let driver = LiteralOnly;
        assert_eq!(driver.fetch_one("SELECT 1", vec![]).await.unwrap(), None);
    }
}
