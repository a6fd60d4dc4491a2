//! Database access: value model, drivers, connections and the manager
//!
//! The driver runs compiled SQL. A [`Connection`] pairs a driver with the
//! platform used to compile for it and keeps the last query for
//! diagnostics. The [`ConnectionManager`] creates that connection lazily.

pub mod connection;
pub mod driver;
pub mod drivers;
pub mod manager;
pub mod types;

pub use connection::Connection;
pub use driver::{Driver, QueryResult};
pub use drivers::MySqlDriver;
pub use manager::ConnectionManager;
pub use types::{Row, SqlValue, ValueKind};
