//! MySQL implementation for qexec

mod client;
mod row;
mod types;

pub use client::MySqlClient;
pub use types::{from_mysql_value, to_mysql_params, to_mysql_value};
