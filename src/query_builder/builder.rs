//! Fluent query builder bound to a connection
//!
//! Structural calls mutate the builder's [`QueryState`] and return
//! `&mut Self` so they can be chained. Terminal calls compile the state,
//! run it through the connection and hand the state back to its empty
//! default, whether or not the call succeeded.
//!
//! ```no_run
//! use fluentdb::{Conditions, DB};
//!
//! # async fn demo() -> fluentdb::Result<()> {
//! let mut query = DB::query().await?;
//! let managers = query
//!     .from("employees")
//!     .where_eq("department", "Sales")
//!     .where_group(|g| {
//!         g.where_gt("salary", 50_000).or_where_null("manager_id");
//!     })
//!     .sort_desc("salary")
//!     .take(5)
//!     .load_dataset()
//!     .await?;
//! # let _ = managers;
//! # Ok(())
//! # }
//! ```

use super::compiler::{self, CompiledQuery};
use super::condition::{ConditionList, Conditions};
use super::pagination::PageRequest;
use super::platforms::Aggregate;
use super::result::{map_row, map_rows, scalar, Dataset, Page, Recordset};
use super::state::{
    Column, JoinClause, JoinType, OrderByClause, OrderDirection, QueryState, RowValues, Statement,
};
use crate::database::driver::QueryResult;
use crate::database::types::{Row, SqlValue};
use crate::database::Connection;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Start a builder on `conn`, same as [`Connection::new_query`]
pub fn new_query(conn: &Arc<Connection>) -> QueryBuilder {
    QueryBuilder::new(Arc::clone(conn))
}

pub struct QueryBuilder {
    conn: Arc<Connection>,
    state: QueryState,
    timeout: Option<Duration>,
}

impl Conditions for QueryBuilder {
    fn conditions_mut(&mut self) -> &mut ConditionList {
        &mut self.state.conditions
    }
}

impl QueryBuilder {
    pub fn new(conn: Arc<Connection>) -> Self {
        Self {
            conn,
            state: QueryState::default(),
            timeout: None,
        }
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.conn
    }

    /// Current accumulated state
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    // ----- projection -----

    /// Replace the projected columns
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.columns = columns
            .into_iter()
            .map(|c| Column::Name(c.into()))
            .collect();
        self
    }

    /// Append an expression that is emitted without quoting
    pub fn select_raw<S: Into<String>>(&mut self, expression: S) -> &mut Self {
        self.state.columns.push(Column::Raw(expression.into()));
        self
    }

    pub fn distinct(&mut self) -> &mut Self {
        self.state.distinct = true;
        self
    }

    // ----- source -----

    /// Set the table, replacing any earlier one
    pub fn from<S: Into<String>>(&mut self, table: S) -> &mut Self {
        self.state.table = Some(table.into());
        self
    }

    pub fn table<S: Into<String>>(&mut self, table: S) -> &mut Self {
        self.from(table)
    }

    pub fn alias<S: Into<String>>(&mut self, alias: S) -> &mut Self {
        self.state.alias = Some(alias.into());
        self
    }

    fn add_join(&mut self, join_type: JoinType, table: String, on: String) -> &mut Self {
        self.state.joins.push(JoinClause {
            join_type,
            table,
            on_condition: on,
        });
        self
    }

    /// `INNER JOIN table ON <on>`, the ON predicate is raw SQL
    pub fn join<T: Into<String>, O: Into<String>>(&mut self, table: T, on: O) -> &mut Self {
        self.add_join(JoinType::Inner, table.into(), on.into())
    }

    pub fn inner_join<T: Into<String>, O: Into<String>>(&mut self, table: T, on: O) -> &mut Self {
        self.add_join(JoinType::Inner, table.into(), on.into())
    }

    pub fn left_join<T: Into<String>, O: Into<String>>(&mut self, table: T, on: O) -> &mut Self {
        self.add_join(JoinType::Left, table.into(), on.into())
    }

    pub fn right_join<T: Into<String>, O: Into<String>>(&mut self, table: T, on: O) -> &mut Self {
        self.add_join(JoinType::Right, table.into(), on.into())
    }

    // ----- ordering and window -----

    pub fn order_by<S: Into<String>>(&mut self, column: S, direction: OrderDirection) -> &mut Self {
        self.state.order_by.push(OrderByClause {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn sort_asc<S: Into<String>>(&mut self, column: S) -> &mut Self {
        self.order_by(column, OrderDirection::Asc)
    }

    pub fn sort_desc<S: Into<String>>(&mut self, column: S) -> &mut Self {
        self.order_by(column, OrderDirection::Desc)
    }

    pub fn take(&mut self, count: u64) -> &mut Self {
        self.state.limit = Some(count);
        self
    }

    pub fn limit(&mut self, count: u64) -> &mut Self {
        self.take(count)
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    pub fn group_by<S: Into<String>>(&mut self, column: S) -> &mut Self {
        self.state.group_by.push(column.into());
        self
    }

    // ----- overrides -----

    /// Run `sql` verbatim, ignoring every structural call
    pub fn raw<S: Into<String>>(&mut self, sql: S) -> &mut Self {
        self.state.raw = Some(sql.into());
        self
    }

    /// Bound the next terminal call
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout);
        self
    }

    // ----- statements -----

    pub fn insert<I, K, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.statement = Statement::Insert(collect_row(row));
        self
    }

    pub fn replace<I, K, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.statement = Statement::Replace(collect_row(row));
        self
    }

    pub fn update<I, K, V>(&mut self, row: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.statement = Statement::Update(collect_row(row));
        self
    }

    pub fn delete(&mut self) -> &mut Self {
        self.state.statement = Statement::Delete;
        self
    }

    // ----- inspection -----

    /// Compile the current state without running or resetting it
    pub fn to_sql(&self) -> Result<CompiledQuery> {
        self.conn.compile(&self.state)
    }

    /// Last query the connection sent to its driver
    pub fn last_query(&self) -> Option<CompiledQuery> {
        self.conn.last_query()
    }

    // ----- terminals -----

    /// First row mapped into `T`
    pub async fn load<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        match self.load_row().await? {
            Some(row) => Ok(Some(map_row(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn load_row(&mut self) -> Result<Option<Row>> {
        let (mut state, timeout) = self.take_state();
        if !state.is_raw() && state.statement == Statement::Select {
            state.limit = Some(state.limit.map_or(1, |l| l.min(1)));
        }
        let query = self.prepare(&state)?;
        self.conn.fetch_one(&query, timeout).await
    }

    /// First column of the first row, `None` when absent or NULL
    pub async fn load_single(&mut self) -> Result<Option<SqlValue>> {
        Ok(scalar(self.load_row().await?))
    }

    pub async fn load_all<T: DeserializeOwned>(&mut self) -> Result<Recordset<T>> {
        let rows = self.load_dataset().await?;
        map_rows(&rows)
    }

    pub async fn load_dataset(&mut self) -> Result<Dataset> {
        let (state, timeout) = self.take_state();
        let query = self.prepare(&state)?;
        self.conn.fetch_all(&query, timeout).await
    }

    pub async fn load_json(&mut self) -> Result<Vec<Value>> {
        let rows = self.load_dataset().await?;
        Ok(rows.iter().map(Row::to_json).collect())
    }

    /// One page of `T` plus the total row count of the filtered query
    pub async fn paginate<T: DeserializeOwned>(
        &mut self,
        page: u64,
        page_size: u64,
    ) -> Result<Page<T>> {
        let (state, timeout) = self.take_state();

        if page_size == 0 {
            return Err(self.reject("Page size must be greater than zero"));
        }
        if state.is_raw() {
            return Err(self.reject("Cannot paginate a raw query"));
        }
        let page = page.max(1);

        let count_query = self.prepare_aggregate(
            &state.without_window(),
            Aggregate::Count,
            "*",
        )?;
        let total = scalar(self.conn.fetch_one(&count_query, timeout).await?)
            .and_then(|v| v.as_i64())
            .unwrap_or(0);

        let mut page_state = state;
        page_state.limit = Some(page_size);
        page_state.offset = Some((page - 1).saturating_mul(page_size));
        let query = self.prepare(&page_state)?;
        let rows = self.conn.fetch_all(&query, timeout).await?;

        Ok(Page {
            items: map_rows(&rows)?,
            total,
            page,
            page_size,
        })
    }

    pub async fn paginate_request<T: DeserializeOwned>(
        &mut self,
        request: &PageRequest,
    ) -> Result<Page<T>> {
        self.paginate(request.page, request.page_size).await
    }

    pub async fn count(&mut self, column: &str) -> Result<i64> {
        let value = self.aggregate(Aggregate::Count, column).await?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    pub async fn count_distinct(&mut self, column: &str) -> Result<i64> {
        let value = self.aggregate(Aggregate::CountDistinct, column).await?;
        Ok(value.and_then(|v| v.as_i64()).unwrap_or(0))
    }

    pub async fn sum(&mut self, column: &str) -> Result<f64> {
        let value = self.aggregate(Aggregate::Sum, column).await?;
        Ok(value.and_then(|v| v.as_f64()).unwrap_or(0.0))
    }

    pub async fn avg(&mut self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(Aggregate::Avg, column).await?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    /// Population standard deviation
    pub async fn std(&mut self, column: &str) -> Result<Option<f64>> {
        let value = self.aggregate(Aggregate::Std, column).await?;
        Ok(value.and_then(|v| v.as_f64()))
    }

    pub async fn min(&mut self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate(Aggregate::Min, column).await
    }

    pub async fn max(&mut self, column: &str) -> Result<Option<SqlValue>> {
        self.aggregate(Aggregate::Max, column).await
    }

    /// Whether the query matches at least one row
    pub async fn exists(&mut self) -> Result<bool> {
        let (mut state, timeout) = self.take_state();
        if !state.is_raw() {
            if state.statement != Statement::Select {
                return Err(self.reject("exists() needs a SELECT query"));
            }
            state.columns = vec![Column::Raw("1".to_string())];
            state.order_by.clear();
            state.limit = Some(1);
        }
        let query = self.prepare(&state)?;
        Ok(self.conn.fetch_one(&query, timeout).await?.is_some())
    }

    /// Run the statement, `true` once it completed
    pub async fn execute(&mut self) -> Result<bool> {
        self.execute_result().await.map(|_| true)
    }

    pub async fn execute_result(&mut self) -> Result<QueryResult> {
        let (state, timeout) = self.take_state();
        let query = self.prepare(&state)?;
        self.conn.execute(&query, timeout).await
    }

    // ----- internals -----

    fn take_state(&mut self) -> (QueryState, Option<Duration>) {
        (std::mem::take(&mut self.state), self.timeout.take())
    }

    fn prepare(&self, state: &QueryState) -> Result<CompiledQuery> {
        self.conn.compile(state).map_err(|e| self.recorded(e))
    }

    fn prepare_aggregate(
        &self,
        state: &QueryState,
        aggregate: Aggregate,
        column: &str,
    ) -> Result<CompiledQuery> {
        compiler::compile_aggregate(state, self.conn.platform(), aggregate, column)
            .map_err(|e| self.recorded(e))
    }

    async fn aggregate(&mut self, aggregate: Aggregate, column: &str) -> Result<Option<SqlValue>> {
        let (state, timeout) = self.take_state();
        let query = self.prepare_aggregate(&state, aggregate, column)?;
        Ok(scalar(self.conn.fetch_one(&query, timeout).await?))
    }

    fn reject(&self, message: &str) -> Error {
        self.recorded(Error::invalid_argument(message))
    }

    fn recorded(&self, error: Error) -> Error {
        self.conn.record_error(&error);
        error
    }
}

fn collect_row<I, K, V>(row: I) -> RowValues
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<SqlValue>,
{
    row.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
