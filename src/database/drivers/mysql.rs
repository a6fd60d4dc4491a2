//! MySQL driver on top of an sqlx pool

use crate::config::DatabaseConfig;
use crate::database::driver::{Driver, QueryResult};
use crate::database::types::{MySqlTypeConverter, Row, SqlValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlPoolOptions};
use sqlx::query::Query;
use sqlx::{MySql, MySqlPool};

/// MySQL database driver
#[derive(Clone)]
pub struct MySqlDriver {
    name: String,
    pool: MySqlPool,
    converter: MySqlTypeConverter,
}

impl MySqlDriver {
    /// Open a pool using the configured connection parameters
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.connection_url();
        log::info!("Connecting to MySQL at {}", sanitize_url(&url));

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&url)
            .await
            .map_err(|e| Error::connection(format!("Failed to connect to MySQL: {}", e)))?;

        log::info!("MySQL connection pool established");
        Ok(Self::from_pool("mysql", pool))
    }

    /// Create a driver from an existing pool
    pub fn from_pool(name: impl Into<String>, pool: MySqlPool) -> Self {
        Self {
            name: name.into(),
            pool,
            converter: MySqlTypeConverter::new(),
        }
    }

    /// Get reference to the underlying pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn bind_all(sql: &str, params: Vec<SqlValue>) -> Query<'_, MySql, MySqlArguments> {
        log::trace!("  Parameters: {:?}", params);
        params
            .into_iter()
            .fold(sqlx::query(sql), MySqlTypeConverter::bind_param)
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    fn name(&self) -> &str {
        &self.name
    }

    fn escape(&self, value: &str) -> String {
        escape_string(value)
    }

    async fn ping(&self) -> Result<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| Error::driver(format!("MySQL ping failed: {}", e)))
    }

    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<QueryResult> {
        let result = Self::bind_all(sql, params)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::driver(e.to_string()))?;

        let last_insert_id = result.last_insert_id();
        Ok(QueryResult {
            rows_affected: result.rows_affected(),
            last_insert_id: (last_insert_id > 0).then_some(last_insert_id as i64),
        })
    }

    async fn fetch_all(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>> {
        let rows = Self::bind_all(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::driver(e.to_string()))?;

        rows.iter()
            .map(|row| self.converter.convert_row(row))
            .collect()
    }

    async fn fetch_one(&self, sql: &str, params: Vec<SqlValue>) -> Result<Option<Row>> {
        let row = Self::bind_all(sql, params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::driver(e.to_string()))?;

        row.map(|row| self.converter.convert_row(&row)).transpose()
    }
}

/// Escape a string the way `mysql_real_escape_string` does
pub fn escape_string(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\x1a' => escaped.push_str("\\Z"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Hide the password in a connection URL
fn sanitize_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("***"));
            }
            parsed.to_string()
        }
        Err(_) => "[invalid URL]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("plain"), "plain");
        assert_eq!(escape_string("O'Brien"), "O\\'Brien");
        assert_eq!(escape_string("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_string("a\\b"), "a\\\\b");
        assert_eq!(escape_string("line\nbreak\r"), "line\\nbreak\\r");
        assert_eq!(escape_string("nul\0sub\x1a"), "nul\\0sub\\Z");
    }

    #[test]
    fn test_sanitize_url() {
        assert_eq!(
            sanitize_url("mysql://app:secret@db:3306/shop"),
            "mysql://app:***@db:3306/shop"
        );
        assert_eq!(sanitize_url("not a url"), "[invalid URL]");
    }
}
