//! A live connection: platform, driver and per-connection diagnostics

use crate::database::driver::{Driver, QueryResult};
use crate::database::types::{Row, SqlValue};
use crate::error::{Error, ErrorLogger, QueryErrorEvent, QueryErrorSink, Result};
use crate::query_builder::compiler::{self, CompiledQuery};
use crate::query_builder::platforms::Platform;
use crate::query_builder::state::QueryState;
use crate::query_builder::QueryBuilder;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

#[derive(Debug, Default)]
struct Diagnostics {
    last_query: Option<CompiledQuery>,
    last_error: Option<String>,
}

/// Long-lived database handle shared as `Arc<Connection>`
pub struct Connection {
    platform: Box<dyn Platform>,
    driver: Arc<dyn Driver>,
    timeout: Option<Duration>,
    sink: Arc<dyn QueryErrorSink>,
    diagnostics: RwLock<Diagnostics>,
}

impl Connection {
    pub fn new(platform: Box<dyn Platform>, driver: Arc<dyn Driver>) -> Self {
        Self {
            platform,
            driver,
            timeout: None,
            sink: Arc::new(ErrorLogger::from_env()),
            diagnostics: RwLock::new(Diagnostics::default()),
        }
    }

    /// Default per-statement timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn QueryErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Start a new query on this connection
    pub fn new_query(self: &Arc<Self>) -> QueryBuilder {
        QueryBuilder::new(Arc::clone(self))
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    pub fn default_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Escape a string with the driver's rules
    pub fn escape(&self, value: &str) -> String {
        self.driver.escape(value)
    }

    /// Render a value as a literal with the driver's rules
    pub fn quote(&self, value: &SqlValue) -> String {
        self.driver.quote(value)
    }

    /// SQL with parameters substituted, for display only
    pub fn interpolate(&self, query: &CompiledQuery) -> String {
        let mut params = query.params.iter();
        let mut out = String::with_capacity(query.sql.len());
        let mut quote: Option<char> = None;
        let mut escaped = false;

        for ch in query.sql.chars() {
            match quote {
                Some(q) => {
                    out.push(ch);
                    if escaped {
                        escaped = false;
                    } else if ch == '\\' {
                        escaped = true;
                    } else if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '\'' | '"' | '`' => {
                        quote = Some(ch);
                        out.push(ch);
                    }
                    '?' => match params.next() {
                        Some(value) => out.push_str(&self.quote(value)),
                        None => out.push(ch),
                    },
                    _ => out.push(ch),
                },
            }
        }

        out
    }

    /// Compile a state with this connection's platform
    pub fn compile(&self, state: &QueryState) -> Result<CompiledQuery> {
        compiler::compile(state, self.platform())
    }

    /// Test database connectivity
    pub async fn ping(&self) -> Result<bool> {
        self.driver.ping().await
    }

    /// Run a data-modifying statement
    pub async fn execute(
        &self,
        query: &CompiledQuery,
        timeout: Option<Duration>,
    ) -> Result<QueryResult> {
        self.run(query, timeout, self.driver.execute(&query.sql, query.params.clone()))
            .await
    }

    /// Run a query and return every row
    pub async fn fetch_all(
        &self,
        query: &CompiledQuery,
        timeout: Option<Duration>,
    ) -> Result<Vec<Row>> {
        self.run(query, timeout, self.driver.fetch_all(&query.sql, query.params.clone()))
            .await
    }

    /// Run a query and return the first row
    pub async fn fetch_one(
        &self,
        query: &CompiledQuery,
        timeout: Option<Duration>,
    ) -> Result<Option<Row>> {
        self.run(query, timeout, self.driver.fetch_one(&query.sql, query.params.clone()))
            .await
    }

    /// The last compiled query sent to the driver, whatever its outcome
    pub fn last_query(&self) -> Option<CompiledQuery> {
        self.diagnostics
            .read()
            .ok()
            .and_then(|d| d.last_query.clone())
    }

    /// Message of the last failed statement, cleared by the next success
    pub fn last_error(&self) -> Option<String> {
        self.diagnostics
            .read()
            .ok()
            .and_then(|d| d.last_error.clone())
    }

    /// Record a failure that happened before the driver was reached
    pub(crate) fn record_error(&self, error: &Error) {
        if let Ok(mut diagnostics) = self.diagnostics.write() {
            diagnostics.last_error = Some(error.to_string());
        }
    }

    async fn run<T, F>(&self, query: &CompiledQuery, timeout: Option<Duration>, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Ok(mut diagnostics) = self.diagnostics.write() {
            diagnostics.last_query = Some(query.clone());
        }

        log::debug!("SQL: {}", query.sql);

        let outcome = match timeout.or(self.timeout) {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout {
                    sql: query.sql.clone(),
                    seconds: limit.as_secs(),
                }),
            },
            None => work.await,
        };

        match outcome {
            Ok(value) => {
                if let Ok(mut diagnostics) = self.diagnostics.write() {
                    diagnostics.last_error = None;
                }
                Ok(value)
            }
            Err(e) => Err(self.fail(query, e)),
        }
    }

    fn fail(&self, query: &CompiledQuery, error: Error) -> Error {
        let error = error.with_sql(&query.sql);
        self.record_error(&error);
        self.sink.report(&QueryErrorEvent::new(
            &error,
            &query.sql,
            query.param_strings(),
        ));
        error
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("platform", &self.platform.kind())
            .field("driver", &self.driver.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::platforms::MySqlPlatform;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FailingDriver;

    #[async_trait]
    impl Driver for FailingDriver {
        fn name(&self) -> &str {
            "failing"
        }

        fn escape(&self, value: &str) -> String {
            crate::database::drivers::mysql::escape_string(value)
        }

        async fn ping(&self) -> Result<bool> {
            Ok(false)
        }

        async fn execute(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<QueryResult> {
            Err(Error::driver("Lock wait timeout exceeded"))
        }

        async fn fetch_all(&self, _sql: &str, _params: Vec<SqlValue>) -> Result<Vec<Row>> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct Collect(Mutex<Vec<QueryErrorEvent>>);

    impl QueryErrorSink for Collect {
        fn report(&self, event: &QueryErrorEvent) {
            if let Ok(mut events) = self.0.lock() {
                events.push(event.clone());
            }
        }
    }

    fn connection(sink: Arc<Collect>) -> Connection {
        Connection::new(Box::new(MySqlPlatform::new()), Arc::new(FailingDriver))
            .with_error_sink(sink)
    }

    #[test]
    fn test_interpolate_skips_quoted_marks() {
        let conn = connection(Arc::default());
        let query = CompiledQuery::new(
            "SELECT '?' AS q FROM `t` WHERE `a` = ? AND `b` IN (?, ?)",
            vec!["O'Brien".into(), 1.into(), SqlValue::Null],
        );
        assert_eq!(
            conn.interpolate(&query),
            "SELECT '?' AS q FROM `t` WHERE `a` = 'O\\'Brien' AND `b` IN (1, NULL)"
        );
    }

    #[tokio::test]
    async fn test_failure_is_recorded_and_reported() {
        let sink = Arc::new(Collect::default());
        let conn = connection(Arc::clone(&sink));
        let query = CompiledQuery::new("DELETE FROM `jobs` WHERE `id` = ?", vec![9.into()]);

        let err = conn.execute(&query, None).await.unwrap_err();
        match &err {
            Error::Query { sql, message } => {
                assert_eq!(sql, "DELETE FROM `jobs` WHERE `id` = ?");
                assert_eq!(message, "Lock wait timeout exceeded");
            }
            other => panic!("Expected Error::Query, got {:?}", other),
        }

        assert_eq!(conn.last_query(), Some(query));
        assert!(conn.last_error().unwrap().contains("Lock wait"));

        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].params, vec!["9".to_string()]);
    }

    #[tokio::test]
    async fn test_timeout() {
        let conn = connection(Arc::default());
        let query = CompiledQuery::new("SELECT SLEEP(5)", vec![]);

        let err = conn
            .fetch_all(&query, Some(Duration::from_millis(20)))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(err.sql(), Some("SELECT SLEEP(5)"));
    }
}
