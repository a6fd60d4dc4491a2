//! Fluent SQL query building
//!
//! - [`condition`]: WHERE tree with nested groups
//! - [`state`]: everything accumulated for one query
//! - [`compiler`]: state to SQL plus bind parameters
//! - [`platforms`]: per-engine quoting, placeholders and limits
//! - [`builder`]: the chainable façade and its terminal calls
//! - [`result`] and [`pagination`]: shapes returned to callers

pub mod builder;
pub mod compiler;
pub mod condition;
pub mod pagination;
pub mod platforms;
pub mod result;
pub mod state;

pub use builder::{new_query, QueryBuilder};
pub use compiler::{compile, compile_aggregate, CompiledQuery, AGGREGATE_ALIAS};
pub use condition::{
    Combinator, ConditionList, ConditionNode, ConditionScope, Conditions, Operator, Predicate,
};
pub use pagination::{PageRequest, Pagination, DEFAULT_PAGE_SIZE};
pub use platforms::{create_platform, Aggregate, Feature, MySqlPlatform, Platform, PlatformKind};
pub use result::{Dataset, Page, Recordset};
pub use state::{
    Column, JoinClause, JoinType, OrderByClause, OrderDirection, QueryState, RowValues, Statement,
};
