//! Accumulated description of one query

use super::condition::ConditionList;
use crate::database::types::SqlValue;
use indexmap::IndexMap;

/// Insertion-ordered column values for INSERT / REPLACE / UPDATE
pub type RowValues = IndexMap<String, SqlValue>;

/// One projected column
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    /// Column reference, quoted by the compiler
    Name(String),
    /// Expression emitted verbatim
    Raw(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl JoinType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    /// Raw ON predicate
    pub on_condition: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: OrderDirection,
}

/// Statement produced when the state is compiled
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Statement {
    #[default]
    Select,
    Insert(RowValues),
    Replace(RowValues),
    Update(RowValues),
    Delete,
}

/// Everything the builder has been told about the current query
///
/// An empty projection means `*`. When `raw` is set it replaces every
/// other field at compile time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryState {
    pub table: Option<String>,
    pub alias: Option<String>,
    pub columns: Vec<Column>,
    pub distinct: bool,
    pub joins: Vec<JoinClause>,
    pub conditions: ConditionList,
    pub order_by: Vec<OrderByClause>,
    pub group_by: Vec<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub raw: Option<String>,
    pub statement: Statement,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_raw(&self) -> bool {
        self.raw.is_some()
    }

    /// Copy for a COUNT over the same filtered rows
    pub fn without_window(&self) -> Self {
        Self {
            order_by: Vec::new(),
            limit: None,
            offset: None,
            ..self.clone()
        }
    }
}
