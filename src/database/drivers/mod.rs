//! Driver implementations

pub mod mysql;

pub use mysql::MySqlDriver;
