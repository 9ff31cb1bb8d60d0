//! qexec - a thin query executor for MySQL
//!
//! Wraps one `mysql_async` session and offers four calls: run a statement
//! and get the affected row count, fetch the first row, fetch all rows, and
//! read the last generated insert id.
//!
//! # Features
//!
//! - **Named parameters**: `:name` placeholders bound from a [`Params`] set
//! - **One round-trip per call**: no retry, no statement cache, no pooling
//! - **One error type**: every failure is a [`QueryError`] naming the query
//!   and parameters, with the driver error as its source
//! - **Ordered rows**: [`ResultRow`] keeps column order and offers typed reads
//!
//! # Example
//!
//! ```ignore
//! use qexec::{params, ConnectionConfig, QueryExecutor};
//!
//! async fn rename(db: &QueryExecutor, id: i64, name: &str) -> qexec::Result<bool> {
//!     let affected = db
//!         .execute(
//!             "UPDATE users SET name = :name WHERE id = :id",
//!             Some(&params! { "name" => name, "id" => id }),
//!         )
//!         .await?;
//!     Ok(affected == 1)
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod mysql;
pub mod params;
pub mod row;
pub mod traits;
pub mod value;

// Re-export main types
pub use config::ConnectionConfig;
pub use error::{ConfigError, QueryError, Result, ValueError};
pub use executor::QueryExecutor;
pub use mysql::MySqlClient;
pub use params::Params;
pub use row::ResultRow;
pub use traits::{Client, FromValue, ToValue};
pub use value::Value;
