//! Connection configuration for qexec

use std::fmt;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use super::defaults;
use crate::error::ConfigError;

/// Where and how to open the database session.
///
/// Every field has a default, so a partial mapping (or none at all) is a
/// valid configuration.
///
/// ```ignore
/// let config: ConnectionConfig = toml::from_str(r#"
///     host = "db.internal"
///     database = "shop"
/// "#)?;
/// let executor = QueryExecutor::connect(&config).await?;
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Server host name or IP address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server TCP port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Default schema; empty connects without one
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_username")]
    pub username: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Character set applied with `SET NAMES` when the session opens
    #[serde(default = "default_charset")]
    pub charset: String,
}

// Default value functions for serde
fn default_host() -> String {
    defaults::HOST.to_string()
}
fn default_port() -> u16 {
    defaults::PORT
}
fn default_database() -> String {
    defaults::DATABASE.to_string()
}
fn default_username() -> String {
    defaults::USERNAME.to_string()
}
fn default_password() -> String {
    defaults::PASSWORD.to_string()
}
fn default_charset() -> String {
    defaults::CHARSET.to_string()
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database: default_database(),
            username: default_username(),
            password: default_password(),
            charset: default_charset(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"***")
            .field("charset", &self.charset)
            .finish()
    }
}

impl ConnectionConfig {
    /// Default config pointed at the given schema
    pub fn for_database(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: ConnectionConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::Load(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(config)
    }

    /// Load configuration using config-rs (file + environment variables)
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        } else {
            builder = builder.add_source(File::with_name("qexec").required(false));
        }

        // Override with environment variables (QEXEC_*)
        builder = builder.add_source(Environment::with_prefix(defaults::ENV_PREFIX).separator("_"));

        let config: ConnectionConfig = builder.build()?.try_deserialize()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation("host is required".into()));
        }

        if self.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".into()));
        }

        if self.username.is_empty() {
            return Err(ConfigError::Validation("username is required".into()));
        }

        // charset is interpolated into SET NAMES, so only identifier characters
        if self.charset.is_empty()
            || !self
                .charset
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::Validation(format!(
                "invalid charset: {:?}",
                self.charset
            )));
        }

        Ok(())
    }

    /// Build driver options for a single session.
    ///
    /// The statement cache is disabled so every parameterised call prepares
    /// its statement afresh.
    pub fn to_opts(&self) -> mysql_async::Opts {
        let db_name = (!self.database.is_empty()).then(|| self.database.clone());

        mysql_async::OptsBuilder::default()
            .ip_or_hostname(self.host.clone())
            .tcp_port(self.port)
            .user(Some(self.username.clone()))
            .pass(Some(self.password.clone()))
            .db_name(db_name)
            .stmt_cache_size(0)
            .init(vec![format!("SET NAMES {}", self.charset)])
            .into()
    }
}
