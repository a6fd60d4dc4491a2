//! Database platform implementations for the query builder
//!
//! A platform is the per-dialect strategy the compiler consults for
//! identifier quoting, placeholders, LIMIT/OFFSET and aggregate names.
//! Only MySQL is implemented. The other named platforms are recognised
//! so configuration can name them, and are rejected by [`create_platform`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod mysql;

pub use mysql::MySqlPlatform;

/// Database platforms known to the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformKind {
    #[serde(rename = "mysql", alias = "mariadb")]
    MySql,
    #[serde(rename = "sqlite", alias = "sqlite3")]
    Sqlite,
    #[serde(rename = "pgsql", alias = "postgres", alias = "postgresql")]
    Postgres,
    #[serde(rename = "sqlsrv", alias = "sqlserver", alias = "mssql")]
    SqlServer,
}

impl PlatformKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformKind::MySql => "mysql",
            PlatformKind::Sqlite => "sqlite",
            PlatformKind::Postgres => "pgsql",
            PlatformKind::SqlServer => "sqlsrv",
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(PlatformKind::MySql),
            "sqlite" | "sqlite3" => Ok(PlatformKind::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Ok(PlatformKind::Postgres),
            "sqlsrv" | "sqlserver" | "mssql" => Ok(PlatformKind::SqlServer),
            other => Err(Error::config(format!("Unknown database platform '{}'", other))),
        }
    }
}

/// Optional SQL capabilities a platform may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    CountDistinct,
    Replace,
    Returning,
}

/// Aggregate functions exposed by the builder's terminal calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Avg,
    Count,
    CountDistinct,
    Min,
    Max,
    Std,
    Sum,
}

/// Trait for database-specific SQL generation
pub trait Platform: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// Quote an identifier (table name, column name) for this database
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Generate a parameter placeholder for the given 1-based position
    fn placeholder(&self, position: usize) -> String;

    /// Generate LIMIT/OFFSET syntax, including the leading space
    fn limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Dialect function name for an aggregate, `None` when unavailable
    fn aggregate_function(&self, aggregate: Aggregate) -> Option<&'static str>;

    fn supports(&self, feature: Feature) -> bool;
}

/// Factory function to create the platform for a configured kind
pub fn create_platform(kind: PlatformKind) -> Result<Box<dyn Platform>> {
    match kind {
        PlatformKind::MySql => Ok(Box::new(MySqlPlatform::new())),
        PlatformKind::Sqlite | PlatformKind::Postgres | PlatformKind::SqlServer => {
            Err(Error::UnsupportedPlatform(kind))
        }
    }
}
