//! MySQL session client

use crate::config::ConnectionConfig;
use crate::error::{QueryError, Result};
use crate::params::Params;
use crate::row::ResultRow;
use crate::traits::Client;
use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Conn, Row as MySqlAsyncRow};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use super::row::to_result_row;
use super::types::to_mysql_params;

/// A single MySQL session.
///
/// Wraps one `mysql_async::Conn` and implements [`Client`]. The session is
/// not pooled: session state such as `LAST_INSERT_ID()`, user variables and
/// open transactions persists across calls.
///
/// # Example
///
/// ```ignore
/// use qexec::{ConnectionConfig, MySqlClient};
///
/// let client = MySqlClient::connect(&ConnectionConfig::for_database("shop")).await?;
/// client.ping().await?;
/// ```
pub struct MySqlClient {
    // mysql_async::Conn needs &mut self for every operation, but Client
    // uses &self; concurrent callers are serialised on this lock.
    conn: Mutex<Conn>,
}

impl MySqlClient {
    /// Open a session with the given settings.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        config.validate().map_err(QueryError::invalid_config)?;

        let conn = Conn::new(config.to_opts())
            .await
            .map_err(QueryError::connect)?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            connection_id = conn.id(),
            "connected to MySQL"
        );

        Ok(Self::from_conn(conn))
    }

    /// Wrap a connection opened elsewhere.
    ///
    /// Its own options apply, including its statement cache.
    pub fn from_conn(conn: Conn) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Exclusive access to the underlying connection.
    ///
    /// Use this for driver features outside the executor's surface, such as
    /// `Conn::start_transaction`. Other calls on this client wait until the
    /// guard is dropped.
    pub async fn lock(&self) -> MutexGuard<'_, Conn> {
        self.conn.lock().await
    }

    /// Check that the server is still reachable.
    pub async fn ping(&self) -> Result<()> {
        self.conn.lock().await.ping().await?;
        Ok(())
    }

    /// Server-side id of this session.
    pub async fn connection_id(&self) -> u32 {
        self.conn.lock().await.id()
    }

    /// Server version as `(major, minor, patch)`.
    pub async fn server_version(&self) -> (u16, u16, u16) {
        self.conn.lock().await.server_version()
    }

    /// Take the underlying connection back.
    pub fn into_inner(self) -> Conn {
        self.conn.into_inner()
    }

    /// Close the session.
    pub async fn disconnect(self) -> Result<()> {
        let conn = self.conn.into_inner();
        let id = conn.id();
        conn.disconnect().await?;
        info!(connection_id = id, "disconnected from MySQL");
        Ok(())
    }
}

#[async_trait]
impl Client for MySqlClient {
    async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<u64> {
        let mut conn = self.conn.lock().await;

        match params {
            Some(params) => {
                let (sql, params) = to_mysql_params(sql, params)?;
                conn.exec_drop(sql, params).await?
            }
            None => conn.query_drop(sql).await?,
        }

        Ok(conn.affected_rows())
    }

    async fn fetch_first(&self, sql: &str, params: Option<&Params>) -> Result<Option<ResultRow>> {
        let mut conn = self.conn.lock().await;

        let row: Option<MySqlAsyncRow> = match params {
            Some(params) => {
                let (sql, params) = to_mysql_params(sql, params)?;
                conn.exec_first(sql, params).await?
            }
            None => conn.query_first(sql).await?,
        };

        Ok(row.map(to_result_row))
    }

    async fn fetch_all(&self, sql: &str, params: Option<&Params>) -> Result<Vec<ResultRow>> {
        let mut conn = self.conn.lock().await;

        let rows: Vec<MySqlAsyncRow> = match params {
            Some(params) => {
                let (sql, params) = to_mysql_params(sql, params)?;
                conn.exec(sql, params).await?
            }
            None => conn.query(sql).await?,
        };

        Ok(rows.into_iter().map(to_result_row).collect())
    }

    /// Reads the session's `LAST_INSERT_ID()`.
    ///
    /// MySQL never generates 0 for an AUTO_INCREMENT column, and reports 0
    /// when the session has not generated an id, so 0 maps to `None`.
    async fn last_insert_id(&self) -> Result<Option<u64>> {
        let mut conn = self.conn.lock().await;
        let id: Option<u64> = conn.query_first("SELECT LAST_INSERT_ID()").await?;
        Ok(id.filter(|&id| id != 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use std::error::Error as _;

    #[tokio::test]
    async fn test_connect_rejects_invalid_config_before_dialing() {
        let config = ConnectionConfig {
            host: String::new(),
            ..Default::default()
        };
        let err = match MySqlClient::connect(&config).await {
            Ok(_) => panic!("an empty host should not connect"),
            Err(err) => err,
        };

        assert!(err.to_string().starts_with("Error connecting to database: "));
        assert!(!err.message().starts_with("Error connecting"));
        assert!(err
            .source()
            .and_then(|e| e.downcast_ref::<ConfigError>())
            .is_some());
    }
}
