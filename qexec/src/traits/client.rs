//! Client trait for a single database session

use std::sync::Arc;

use crate::error::Result;
use crate::params::Params;
use crate::row::ResultRow;
use async_trait::async_trait;

/// One open database session that can run statements.
///
/// This is the only thing [`QueryExecutor`] needs from a driver. Each method
/// performs exactly one round-trip. With `Some(params)` the statement is
/// prepared and every entry is bound to its `:name` placeholder; with `None`
/// the text is sent as-is.
///
/// Implementations report driver failures as [`QueryError`] without query
/// context; the executor attaches the query text and parameters.
///
/// [`QueryExecutor`]: crate::QueryExecutor
/// [`QueryError`]: crate::QueryError
#[async_trait]
pub trait Client: Send + Sync {
    /// Run a statement and return the number of affected rows.
    async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<u64>;

    /// Run a query and return its first row, if any.
    async fn fetch_first(&self, sql: &str, params: Option<&Params>) -> Result<Option<ResultRow>>;

    /// Run a query and return every row in result order.
    async fn fetch_all(&self, sql: &str, params: Option<&Params>) -> Result<Vec<ResultRow>>;

    /// The id generated by the most recent insert in this session.
    ///
    /// `None` means the session has no generated id to report.
    async fn last_insert_id(&self) -> Result<Option<u64>>;
}

#[async_trait]
impl<C: Client + ?Sized> Client for &C {
    async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<u64> {
        (**self).execute(sql, params).await
    }

    async fn fetch_first(&self, sql: &str, params: Option<&Params>) -> Result<Option<ResultRow>> {
        (**self).fetch_first(sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: Option<&Params>) -> Result<Vec<ResultRow>> {
        (**self).fetch_all(sql, params).await
    }

    async fn last_insert_id(&self) -> Result<Option<u64>> {
        (**self).last_insert_id().await
    }
}

#[async_trait]
impl<C: Client + ?Sized> Client for Arc<C> {
    async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<u64> {
        (**self).execute(sql, params).await
    }

    async fn fetch_first(&self, sql: &str, params: Option<&Params>) -> Result<Option<ResultRow>> {
        (**self).fetch_first(sql, params).await
    }

    async fn fetch_all(&self, sql: &str, params: Option<&Params>) -> Result<Vec<ResultRow>> {
        (**self).fetch_all(sql, params).await
    }

    async fn last_insert_id(&self) -> Result<Option<u64>> {
        (**self).last_insert_id().await
    }
}
