//! FluentDB - a fluent SQL query builder and execution layer
//!
//! FluentDB provides:
//! - A chainable builder with nested AND/OR condition groups
//! - Compilation to parameterised SQL through a per-platform strategy
//! - A lazily connected, shared connection with query diagnostics
//! - Typed results, scalar aggregates and pagination
//!
//! MySQL is the implemented platform. SQLite, PostgreSQL and SQL Server are
//! recognised in configuration and rejected with
//! [`Error::UnsupportedPlatform`].

// Enforce error handling best practices
#![cfg_attr(
    not(test),
    warn(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
    )
)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used,))]

pub mod config;
pub mod error;

// Drivers, connections and the value model
pub mod database;

// Global database access
pub mod db;

// Builder, compiler and platforms
pub mod query_builder;

// Re-export main types for public API
pub use config::{DatabaseConfig, Environment};
pub use database::{
    Connection, ConnectionManager, Driver, MySqlDriver, QueryResult, Row, SqlValue, ValueKind,
};
pub use db::DB;
pub use error::{Error, ErrorLogger, QueryErrorEvent, QueryErrorSink, Result};
pub use query_builder::{
    new_query, CompiledQuery, ConditionScope, Conditions, Dataset, OrderDirection, Page,
    PageRequest, Pagination, PlatformKind, QueryBuilder, Recordset,
};
