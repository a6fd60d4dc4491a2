//! Global database access
//!
//! Applications that want one process-wide connection manager initialise it
//! here once. Only the manager is global; query builders are always owned
//! by the caller.

use crate::config::DatabaseConfig;
use crate::database::{Connection, ConnectionManager};
use crate::error::{Error, Result};
use crate::query_builder::QueryBuilder;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Global connection manager
static MANAGER: OnceCell<Arc<ConnectionManager>> = OnceCell::new();

/// Global database access point
pub struct DB;

impl DB {
    /// Initialise the global manager from configuration
    ///
    /// Fails on an unsupported platform, an invalid configuration or a
    /// second initialisation. No connection is opened yet.
    ///
    /// # Examples
    /// ```no_run
    /// # async fn run() -> fluentdb::Result<()> {
    /// use fluentdb::{Conditions, DatabaseConfig, DB};
    ///
    /// DB::init(DatabaseConfig::load(".")?)?;
    /// let active = DB::query()
    ///     .await?
    ///     .from("users")
    ///     .where_eq("active", true)
    ///     .count("*")
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn init(config: DatabaseConfig) -> Result<()> {
        Self::init_with(ConnectionManager::new(config)?)
    }

    /// Install an already built manager
    pub fn init_with(manager: ConnectionManager) -> Result<()> {
        log::info!(
            "Initializing global database manager (platform: {})",
            manager.platform_kind()
        );
        MANAGER
            .set(Arc::new(manager))
            .map_err(|_| Error::config("Database has already been initialized"))
    }

    pub fn is_initialized() -> bool {
        MANAGER.get().is_some()
    }

    /// The global manager
    pub fn manager() -> Result<Arc<ConnectionManager>> {
        MANAGER
            .get()
            .cloned()
            .ok_or_else(|| Error::config("Database not initialized. Call DB::init() first."))
    }

    /// The shared connection, opened on first use
    pub async fn connection() -> Result<Arc<Connection>> {
        Self::manager()?.connection().await
    }

    /// Start a new query on the shared connection
    pub async fn query() -> Result<QueryBuilder> {
        Ok(Self::connection().await?.new_query())
    }

    /// Test database connectivity
    pub async fn ping() -> Result<bool> {
        Self::connection().await?.ping().await
    }
}
