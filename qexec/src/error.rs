//! Error types for qexec

use thiserror::Error;

/// Result type alias for qexec operations
pub type Result<T> = std::result::Result<T, QueryError>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// SQLSTATE reported when bound parameters and placeholders do not match up.
pub const SQLSTATE_INVALID_PARAMETER_NUMBER: &str = "HY093";

/// SQLSTATE reported when a bound date or time cannot be stored by MySQL.
pub const SQLSTATE_DATETIME_OVERFLOW: &str = "22008";

/// The single error raised by a round-trip to the database.
///
/// Connecting, preparing, binding and executing all fail with this type.
/// The originating driver error stays reachable through
/// [`std::error::Error::source`], and the server error code and SQLSTATE are
/// copied out of it when the server produced one.
#[derive(Error, Debug)]
#[error("{summary}")]
pub struct QueryError {
    summary: String,
    message: String,
    code: Option<u16>,
    sql_state: Option<String>,
    query: Option<String>,
    params: Option<String>,
    #[source]
    source: Option<BoxError>,
}

impl QueryError {
    /// Create an error that did not come from the driver.
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            summary: message.clone(),
            message,
            code: None,
            sql_state: None,
            query: None,
            params: None,
            source: None,
        }
    }

    /// Wrap a failure to open the connection.
    pub fn connect(err: mysql_async::Error) -> Self {
        let mut error = Self::from(err);
        error.summary = format!("Error connecting to database: {}", error.message);
        error
    }

    /// Wrap connection settings that failed validation.
    pub fn invalid_config(err: ConfigError) -> Self {
        let message = err.to_string();
        Self {
            summary: format!("Error connecting to database: {}", message),
            message,
            code: None,
            sql_state: None,
            query: None,
            params: None,
            source: Some(Box::new(err)),
        }
    }

    /// Error for a `:name` placeholder that has no bound value.
    pub fn missing_parameter(name: &str) -> Self {
        Self::new(format!(
            "Invalid parameter number: no value bound for placeholder :{}",
            name
        ))
        .with_sql_state(SQLSTATE_INVALID_PARAMETER_NUMBER)
    }

    /// Error for a bound date outside the years MySQL can store.
    pub fn datetime_overflow(name: &str, value: impl std::fmt::Display) -> Self {
        Self::new(format!(
            "Datetime field overflow: parameter :{} ({}) is outside the years 0..=9999",
            name, value
        ))
        .with_sql_state(SQLSTATE_DATETIME_OVERFLOW)
    }

    /// Error for a bound parameter that has no `:name` placeholder.
    pub fn undefined_parameter(name: &str) -> Self {
        Self::new(format!(
            "Invalid parameter number: parameter :{} was not defined",
            name
        ))
        .with_sql_state(SQLSTATE_INVALID_PARAMETER_NUMBER)
    }

    /// Set the server error code.
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the SQLSTATE.
    pub fn with_sql_state(mut self, state: impl Into<String>) -> Self {
        self.sql_state = Some(state.into());
        self
    }

    /// Attach the query text and parameter dump the error was raised for.
    ///
    /// The display form then names both, so the failing call can be
    /// reproduced from a log line alone.
    pub fn with_query(mut self, query: &str, params: String) -> Self {
        self.summary = format!(
            "Error executing query on database: {}, using query: {} and params: {}",
            self.message, query, params
        );
        self.query = Some(query.to_string());
        self.params = Some(params);
        self
    }

    /// The driver's own message, without query context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The server error number (e.g. 1064 for a syntax error), if any.
    pub fn code(&self) -> Option<u16> {
        self.code
    }

    /// The five-character SQLSTATE, if any.
    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    /// The query text the error was raised for.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The textual dump of the bound parameters.
    pub fn params(&self) -> Option<&str> {
        self.params.as_deref()
    }

    /// The driver error this was built from, if it was a `mysql_async` one.
    pub fn driver_error(&self) -> Option<&mysql_async::Error> {
        self.source.as_ref()?.downcast_ref()
    }
}

impl From<mysql_async::Error> for QueryError {
    fn from(err: mysql_async::Error) -> Self {
        let (message, code, sql_state) = match &err {
            mysql_async::Error::Server(server) => (
                server.message.clone(),
                Some(server.code),
                Some(server.state.clone()),
            ),
            other => (other.to_string(), None, None),
        };

        Self {
            summary: message.clone(),
            message,
            code,
            sql_state,
            query: None,
            params: None,
            source: Some(Box::new(err)),
        }
    }
}

/// Errors raised when reading typed values out of a row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// Type conversion error
    #[error("Type conversion error: expected {expected}, got {actual}")]
    TypeConversion {
        expected: &'static str,
        actual: String,
    },

    /// Column not found in row
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// Errors that can occur while loading connection settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Load(err.to_string())
    }
}
