use crate::error::{Error, Result};
use crate::query_builder::platforms::PlatformKind;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Environment type for configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Get environment from string
    pub fn from_str(env: &str) -> Self {
        match env.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    /// Get environment name as used in `config.{env}.toml`
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "dev",
            Environment::Production => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Detect current environment from `FLUENTDB_ENV`
    pub fn detect() -> Self {
        env::var("FLUENTDB_ENV")
            .map(|env| Environment::from_str(&env))
            .unwrap_or_default()
    }
}

/// Connection parameters for one database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_platform")]
    pub platform: PlatformKind,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub database: String,

    /// Full connection URL, takes precedence over the individual parts
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Per-statement timeout in seconds, 0 disables it
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

fn default_platform() -> PlatformKind {
    PlatformKind::MySql
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    3306
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    30
}
fn default_query_timeout() -> u64 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            platform: default_platform(),
            host: default_host(),
            port: default_port(),
            username: String::new(),
            password: String::new(),
            database: String::new(),
            url: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            query_timeout: default_query_timeout(),
        }
    }
}

impl DatabaseConfig {
    /// Configuration for a connection URL with default pool settings
    pub fn from_url(platform: PlatformKind, url: impl Into<String>) -> Self {
        Self {
            platform,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Load `config.toml` from a directory and merge `config.{env}.toml` on top
    ///
    /// Settings live under the `[database]` table. Environment variables are
    /// applied after the merge, then the result is validated.
    #[cfg(feature = "config")]
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let env = Environment::detect();

        let base_path = base_dir.join("config.toml");
        let mut merged = if base_path.exists() {
            load_toml_value(&base_path)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let env_path = base_dir.join(format!("config.{}.toml", env.as_str()));
        if env_path.exists() {
            log::debug!(
                "Loading environment-specific config from: {}",
                env_path.display()
            );
            let env_value = load_toml_value(&env_path)?;
            merged = serde_toml_merge::merge(merged, env_value).map_err(|e| {
                Error::config(format!("Failed to merge configuration files: {}", e))
            })?;
        }

        let mut config = Self::from_toml_value(merged)?;
        config.apply_env_overrides()?;
        config.validate()?;

        log::info!(
            "Database configuration loaded (environment: {}, platform: {})",
            env.as_str(),
            config.platform
        );

        Ok(config)
    }

    /// Load configuration from a single TOML file, without overrides
    #[cfg(feature = "config")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let value = load_toml_value(path.as_ref())?;
        Self::from_toml_value(value)
    }

    /// Parse configuration from TOML text
    #[cfg(feature = "config")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let value: toml::Value = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse configuration: {}", e)))?;
        Self::from_toml_value(value)
    }

    #[cfg(feature = "config")]
    fn from_toml_value(value: toml::Value) -> Result<Self> {
        let section = match value {
            toml::Value::Table(mut table) => table
                .remove("database")
                .unwrap_or(toml::Value::Table(toml::map::Map::new())),
            _ => return Err(Error::config("Configuration root must be a table")),
        };

        // Go through serde_json so defaults apply the same way for every source
        let json_value = serde_json::to_value(&section)
            .map_err(|e| Error::config(format!("Failed to convert configuration: {}", e)))?;
        serde_json::from_value(json_value)
            .map_err(|e| Error::config(format!("Invalid [database] configuration: {}", e)))
    }

    /// Apply `FLUENTDB_DB_*` and `DATABASE_URL` environment overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(platform) = lookup("FLUENTDB_DB_PLATFORM") {
            self.platform = platform.parse()?;
        }
        if let Some(host) = lookup("FLUENTDB_DB_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("FLUENTDB_DB_PORT") {
            self.port = port
                .parse()
                .map_err(|_| Error::config("Invalid FLUENTDB_DB_PORT value"))?;
        }
        if let Some(username) = lookup("FLUENTDB_DB_USER") {
            self.username = username;
        }
        if let Some(password) = lookup("FLUENTDB_DB_PASSWORD") {
            self.password = password;
        }
        if let Some(database) = lookup("FLUENTDB_DB_NAME") {
            self.database = database;
        }
        if let Some(max_conn) = lookup("FLUENTDB_DB_MAX_CONNECTIONS") {
            self.max_connections = max_conn
                .parse()
                .map_err(|_| Error::config("Invalid FLUENTDB_DB_MAX_CONNECTIONS value"))?;
        }
        if let Some(timeout) = lookup("FLUENTDB_DB_QUERY_TIMEOUT") {
            self.query_timeout = timeout
                .parse()
                .map_err(|_| Error::config("Invalid FLUENTDB_DB_QUERY_TIMEOUT value"))?;
        }

        // DATABASE_URL is the conventional name, FLUENTDB_DB_URL wins over it
        if let Some(url) = lookup("FLUENTDB_DB_URL").or_else(|| lookup("DATABASE_URL")) {
            self.url = Some(url);
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::config("max_connections must be greater than 0"));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::config(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }

        match &self.url {
            Some(url) if url.trim().is_empty() => {
                return Err(Error::config("Database url cannot be empty"));
            }
            Some(_) => {}
            None => {
                if self.host.is_empty() {
                    return Err(Error::config("Database host is required"));
                }
                if self.port == 0 {
                    return Err(Error::config("Database port cannot be 0"));
                }
                if self.database.is_empty() {
                    return Err(Error::config("Database name is required"));
                }
            }
        }

        Ok(())
    }

    /// Connection URL for the driver, credentials percent-encoded
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        let scheme = match self.platform {
            PlatformKind::MySql => "mysql",
            PlatformKind::Sqlite => "sqlite",
            PlatformKind::Postgres => "postgres",
            PlatformKind::SqlServer => "mssql",
        };

        let credentials = if self.username.is_empty() {
            String::new()
        } else if self.password.is_empty() {
            format!("{}@", urlencoding::encode(&self.username))
        } else {
            format!(
                "{}:{}@",
                urlencoding::encode(&self.username),
                urlencoding::encode(&self.password)
            )
        };

        format!(
            "{}://{}{}:{}/{}",
            scheme, credentials, self.host, self.port, self.database
        )
    }

    /// Default per-statement timeout, `None` when disabled
    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout > 0).then(|| Duration::from_secs(self.query_timeout))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }
}

#[cfg(feature = "config")]
fn load_toml_value(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::config(format!(
            "Failed to parse config file '{}': {}. Check TOML syntax.",
            path.display(),
            e
        ))
    })
}
