//! Unified type system for database operations
//!
//! [`SqlValue`] is the single value model for bound parameters and fetched
//! columns. [`Row`] is one fetched row.

pub mod mysql_converter;
pub mod row;
pub mod value;

pub use mysql_converter::MySqlTypeConverter;
pub use row::Row;
pub use value::{SqlValue, ValueKind};
