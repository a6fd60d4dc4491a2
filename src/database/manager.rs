//! Lazy, once-per-manager connection setup

use crate::config::DatabaseConfig;
use crate::database::connection::Connection;
use crate::database::driver::Driver;
use crate::database::drivers::MySqlDriver;
use crate::error::{Error, ErrorLogger, QueryErrorSink, Result};
use crate::query_builder::platforms::{create_platform, PlatformKind};
use crate::query_builder::QueryBuilder;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Owns the configuration and the single [`Connection`] built from it
///
/// The platform is resolved when the manager is created, so an
/// unsupported platform fails before any network activity. The driver
/// is created on the first call to [`ConnectionManager::connection`].
pub struct ConnectionManager {
    config: DatabaseConfig,
    injected: Option<Arc<dyn Driver>>,
    timeout: Option<Duration>,
    sink: Arc<dyn QueryErrorSink>,
    connection: OnceCell<Arc<Connection>>,
}

impl ConnectionManager {
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        create_platform(config.platform)?;
        config.validate()?;

        Ok(Self {
            timeout: config.query_timeout(),
            config,
            injected: None,
            sink: Arc::new(ErrorLogger::from_env()),
            connection: OnceCell::new(),
        })
    }

    /// Use an already constructed driver instead of connecting
    pub fn with_driver(platform: PlatformKind, driver: Arc<dyn Driver>) -> Result<Self> {
        create_platform(platform)?;

        let config = DatabaseConfig {
            platform,
            ..DatabaseConfig::default()
        };

        Ok(Self {
            timeout: config.query_timeout(),
            config,
            injected: Some(driver),
            sink: Arc::new(ErrorLogger::from_env()),
            connection: OnceCell::new(),
        })
    }

    /// Default per-statement timeout for the connection
    pub fn query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn error_sink(mut self, sink: Arc<dyn QueryErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn platform_kind(&self) -> PlatformKind {
        self.config.platform
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.connection.initialized()
    }

    /// The shared connection, created on first use
    ///
    /// A failed attempt leaves the manager unconnected; the next call
    /// tries again.
    pub async fn connection(&self) -> Result<Arc<Connection>> {
        self.connection
            .get_or_try_init(|| async {
                let driver = match &self.injected {
                    Some(driver) => Arc::clone(driver),
                    None => self.connect_driver().await?,
                };
                let platform = create_platform(self.config.platform)?;

                log::debug!(
                    "Connection ready (platform: {}, driver: {})",
                    self.config.platform,
                    driver.name()
                );

                Ok::<_, Error>(Arc::new(
                    Connection::new(platform, driver)
                        .with_timeout(self.timeout)
                        .with_error_sink(Arc::clone(&self.sink)),
                ))
            })
            .await
            .cloned()
    }

    /// Start a new query on the shared connection
    pub async fn query(&self) -> Result<QueryBuilder> {
        Ok(self.connection().await?.new_query())
    }

    async fn connect_driver(&self) -> Result<Arc<dyn Driver>> {
        match self.config.platform {
            PlatformKind::MySql => Ok(Arc::new(MySqlDriver::connect(&self.config).await?)),
            other => Err(Error::UnsupportedPlatform(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mysql_config() -> DatabaseConfig {
        DatabaseConfig {
            database: "app".to_string(),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_unsupported_platform_fails_at_construction() {
        for platform in [
            PlatformKind::Sqlite,
            PlatformKind::Postgres,
            PlatformKind::SqlServer,
        ] {
            let config = DatabaseConfig {
                platform,
                ..mysql_config()
            };
            match ConnectionManager::new(config) {
                Err(Error::UnsupportedPlatform(kind)) => assert_eq!(kind, platform),
                Err(other) => panic!("Expected UnsupportedPlatform, got {:?}", other),
                Ok(_) => panic!("Expected UnsupportedPlatform for {}", platform),
            }
        }
    }

    #[test]
    fn test_manager_does_not_connect_eagerly() {
        let manager = ConnectionManager::new(mysql_config()).unwrap();
        assert!(!manager.is_connected());
        assert_eq!(manager.platform_kind(), PlatformKind::MySql);
        assert_eq!(manager.config().query_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = DatabaseConfig {
            max_connections: 0,
            ..mysql_config()
        };
        assert!(matches!(
            ConnectionManager::new(config),
            Err(Error::Config(_))
        ));
    }
}
