//! Default connection values - single source of truth

/// Default server host (loopback)
pub const HOST: &str = "127.0.0.1";

/// Default server port
pub const PORT: u16 = 3306;

/// Default schema (empty means no default schema)
pub const DATABASE: &str = "";

/// Default user name
pub const USERNAME: &str = "root";

/// Default password
pub const PASSWORD: &str = "root";

/// Default connection character set
pub const CHARSET: &str = "utf8mb4";

/// Prefix for environment variable overrides (`QEXEC_HOST`, ...)
pub const ENV_PREFIX: &str = "QEXEC";
