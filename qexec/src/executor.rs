//! Query executor

use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::mysql::MySqlClient;
use crate::params::{check_bindings, Params};
use crate::row::ResultRow;
use crate::traits::Client;
use tracing::debug;

/// Runs one statement per call against a single client session.
///
/// Every call prepares and executes its statement exactly once, with no
/// retry and no caching. With `Some(params)` each entry is bound to its
/// `:name` placeholder; with `None` the query text is sent directly, so it
/// must never contain untrusted input.
///
/// Any failure comes back as a [`QueryError`] that names the query and the
/// bound parameters. An empty result is not a failure: `select_first`
/// returns `None` and `select_all` returns an empty `Vec`.
///
/// # Example
///
/// ```ignore
/// use qexec::{params, ConnectionConfig, QueryExecutor};
///
/// let db = QueryExecutor::connect(&ConnectionConfig::for_database("shop")).await?;
///
/// db.execute(
///     "INSERT INTO users (name) VALUES (:name)",
///     Some(&params! { "name" => "alice" }),
/// )
/// .await?;
/// let id = db.last_inserted_id().await?;
///
/// let user = db
///     .select_first("SELECT * FROM users WHERE id = :id", Some(&params! { "id" => id }))
///     .await?;
/// ```
///
/// [`QueryError`]: crate::QueryError
pub struct QueryExecutor<C: Client = MySqlClient> {
    client: C,
}

impl QueryExecutor<MySqlClient> {
    /// Open a MySQL session and wrap it.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let client = MySqlClient::connect(config).await?;
        Ok(Self::new(client))
    }
}

impl<C: Client> QueryExecutor<C> {
    /// Wrap an open client session.
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Borrow the wrapped client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Unwrap the client, e.g. to disconnect it.
    pub fn into_inner(self) -> C {
        self.client
    }

    /// Run an INSERT, UPDATE or DELETE and return the number of affected rows.
    pub async fn execute(&self, query: &str, params: Option<&Params>) -> Result<u64> {
        debug!(query, params = param_count(params), "execute");
        self.prepare(query, params)?;

        let affected = self
            .client
            .execute(query, params)
            .await
            .map_err(|e| with_context(e, query, params))?;

        debug!(affected, "execute done");
        Ok(affected)
    }

    /// Run a query and return its first row, or `None` if nothing matched.
    pub async fn select_first(
        &self,
        query: &str,
        params: Option<&Params>,
    ) -> Result<Option<ResultRow>> {
        debug!(query, params = param_count(params), "select_first");
        self.prepare(query, params)?;

        self.client
            .fetch_first(query, params)
            .await
            .map_err(|e| with_context(e, query, params))
    }

    /// Run a query and return every row, in the order the server sent them.
    pub async fn select_all(&self, query: &str, params: Option<&Params>) -> Result<Vec<ResultRow>> {
        debug!(query, params = param_count(params), "select_all");
        self.prepare(query, params)?;

        let rows = self
            .client
            .fetch_all(query, params)
            .await
            .map_err(|e| with_context(e, query, params))?;

        debug!(rows = rows.len(), "select_all done");
        Ok(rows)
    }

    /// The id generated by the most recent insert in this session.
    ///
    /// `None` if the session has not generated one. Whether an id of 0 is
    /// reported as `Some(0)` is up to the client; [`MySqlClient`] never
    /// does, since MySQL never generates it.
    pub async fn last_inserted_id(&self) -> Result<Option<u64>> {
        let id = self.client.last_insert_id().await?;
        debug!(?id, "last_inserted_id");
        Ok(id)
    }

    fn prepare(&self, query: &str, params: Option<&Params>) -> Result<()> {
        if let Some(params) = params {
            check_bindings(query, params).map_err(|e| with_context(e, query, Some(params)))?;
        }
        Ok(())
    }
}

fn param_count(params: Option<&Params>) -> usize {
    params.map_or(0, Params::len)
}

fn with_context(
    err: crate::QueryError,
    query: &str,
    params: Option<&Params>,
) -> crate::QueryError {
    debug!(error = %err, query, "query failed");
    err.with_query(query, Params::describe(params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::value::Value;
    use crate::{params, traits::Client};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// What the fake client saw for one call.
    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        op: &'static str,
        sql: String,
        params: Option<Params>,
    }

    /// In-memory client: a `users` table keyed by id, plus scripted failures.
    #[derive(Default)]
    struct FakeClient {
        calls: Mutex<Vec<Call>>,
        users: Mutex<BTreeMap<u64, String>>,
        last_id: Mutex<Option<u64>>,
        fail_with: Option<(u16, &'static str)>,
    }

    impl FakeClient {
        fn with_users(names: &[&str]) -> Self {
            let client = Self::default();
            {
                let mut users = client.users.lock().unwrap();
                for (i, name) in names.iter().enumerate() {
                    users.insert(i as u64 + 1, name.to_string());
                }
            }
            client
        }

        fn failing(code: u16, message: &'static str) -> Self {
            Self {
                fail_with: Some((code, message)),
                ..Default::default()
            }
        }

        fn record(&self, op: &'static str, sql: &str, params: Option<&Params>) -> Result<()> {
            self.calls.lock().unwrap().push(Call {
                op,
                sql: sql.to_string(),
                params: params.cloned(),
            });
            match self.fail_with {
                Some((code, message)) => Err(QueryError::new(message)
                    .with_code(code)
                    .with_sql_state("42000")),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn rows(&self, params: Option<&Params>) -> Vec<ResultRow> {
            let wanted = params
                .and_then(|p| p.get("id"))
                .and_then(|v| match v {
                    Value::I64(id) => Some(*id as u64),
                    _ => None,
                });
            self.users
                .lock()
                .unwrap()
                .iter()
                .filter(|(id, _)| wanted.map_or(true, |w| w == **id))
                .map(|(id, name)| {
                    vec![
                        ("id".to_string(), Value::U64(*id)),
                        ("name".to_string(), Value::String(name.clone())),
                    ]
                    .into_iter()
                    .collect()
                })
                .collect()
        }
    }

    #[async_trait]
    impl Client for FakeClient {
        async fn execute(&self, sql: &str, params: Option<&Params>) -> Result<u64> {
            self.record("execute", sql, params)?;
            if sql.starts_with("INSERT") {
                let name = params
                    .and_then(|p| p.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                let mut users = self.users.lock().unwrap();
                let id = users.keys().next_back().copied().unwrap_or(0) + 1;
                users.insert(id, name);
                *self.last_id.lock().unwrap() = Some(id);
                return Ok(1);
            }
            Ok(self.rows(params).len() as u64)
        }

        async fn fetch_first(
            &self,
            sql: &str,
            params: Option<&Params>,
        ) -> Result<Option<ResultRow>> {
            self.record("fetch_first", sql, params)?;
            Ok(self.rows(params).into_iter().next())
        }

        async fn fetch_all(&self, sql: &str, params: Option<&Params>) -> Result<Vec<ResultRow>> {
            self.record("fetch_all", sql, params)?;
            Ok(self.rows(params))
        }

        async fn last_insert_id(&self) -> Result<Option<u64>> {
            Ok(*self.last_id.lock().unwrap())
        }
    }

    const BY_ID: &str = "SELECT * FROM users WHERE id = :id";

    #[tokio::test]
    async fn test_select_first_returns_none_when_nothing_matches() {
        let db = QueryExecutor::new(FakeClient::with_users(&["alice"]));
        let row = db
            .select_first(BY_ID, Some(&params! { "id" => 99i64 }))
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn test_select_all_returns_empty_vec_when_nothing_matches() {
        let db = QueryExecutor::new(FakeClient::default());
        let rows = db.select_all("SELECT * FROM users", None).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_select_first_matches_head_of_select_all() {
        let db = QueryExecutor::new(FakeClient::with_users(&["alice", "bob"]));
        let all = db.select_all("SELECT * FROM users", None).await.unwrap();
        let first = db.select_first("SELECT * FROM users", None).await.unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(first.as_ref(), all.first());
        assert_eq!(all[1].get::<String>("name").unwrap(), "bob");
    }

    #[tokio::test]
    async fn test_params_are_forwarded_and_none_is_not_bound() {
        let client = FakeClient::with_users(&["alice"]);
        let db = QueryExecutor::new(&client);

        let params = params! { "id" => 1i64 };
        db.select_first(BY_ID, Some(&params)).await.unwrap();
        db.select_all("SELECT * FROM users", None).await.unwrap();

        assert_eq!(
            client.calls(),
            vec![
                Call {
                    op: "fetch_first",
                    sql: BY_ID.to_string(),
                    params: Some(params),
                },
                Call {
                    op: "fetch_all",
                    sql: "SELECT * FROM users".to_string(),
                    params: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_parameter_fails_before_round_trip() {
        let client = FakeClient::with_users(&["alice"]);
        let db = QueryExecutor::new(&client);

        let params = params! { "id" => 1i64, "status" => "active" };
        let err = db.select_all(BY_ID, Some(&params)).await.unwrap_err();

        assert_eq!(err.sql_state(), Some("HY093"));
        assert_eq!(err.query(), Some(BY_ID));
        assert!(err.to_string().contains(BY_ID));
        assert!(err.to_string().contains(":status => \"active\""));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unbound_placeholder_fails_before_round_trip() {
        let client = FakeClient::with_users(&["alice"]);
        let db = QueryExecutor::new(&client);

        let query = "SELECT * FROM users WHERE id = :id AND name = :name";
        let err = db
            .select_first(query, Some(&params! { "id" => 1i64 }))
            .await
            .unwrap_err();

        assert_eq!(err.sql_state(), Some("HY093"));
        assert!(err.message().contains(":name"));
        assert_eq!(err.query(), Some(query));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_case_parameter_names_are_bound() {
        let client = FakeClient::with_users(&["alice"]);
        let db = QueryExecutor::new(&client);

        let query = "SELECT * FROM users WHERE id = :userId";
        let params = params! { "userId" => 1i64 };
        db.select_first(query, Some(&params)).await.unwrap();

        assert_eq!(client.calls()[0].params, Some(params));
    }

    #[tokio::test]
    async fn test_execute_returns_affected_rows() {
        let db = QueryExecutor::new(FakeClient::with_users(&["alice", "bob"]));

        let affected = db
            .execute("UPDATE users SET name = 'x'", None)
            .await
            .unwrap();
        assert_eq!(affected, 2);

        let affected = db
            .execute(
                "UPDATE users SET name = 'x' WHERE id = :id",
                Some(&params! { "id" => 42i64 }),
            )
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_last_inserted_id_tracks_inserts() {
        let db = QueryExecutor::new(FakeClient::default());
        assert_eq!(db.last_inserted_id().await.unwrap(), None);

        db.execute(
            "INSERT INTO users (name) VALUES (:name)",
            Some(&params! { "name" => "carol" }),
        )
        .await
        .unwrap();

        let id = db.last_inserted_id().await.unwrap();
        assert_eq!(id, Some(1));

        let row = db
            .select_first(BY_ID, Some(&params! { "id" => 1i64 }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.get::<String>("name").unwrap(), "carol");
    }

    #[tokio::test]
    async fn test_client_errors_carry_query_and_params() {
        let db = QueryExecutor::new(FakeClient::failing(1064, "You have an error in your SQL"));
        let params = params! { "id" => 5i64 };

        let checks = [
            db.execute(BY_ID, Some(&params)).await.map(|_| ()),
            db.select_first(BY_ID, Some(&params)).await.map(|_| ()),
            db.select_all(BY_ID, Some(&params)).await.map(|_| ()),
        ];

        for result in checks {
            let err = result.unwrap_err();
            assert_eq!(err.code(), Some(1064));
            assert_eq!(err.sql_state(), Some("42000"));
            assert_eq!(err.message(), "You have an error in your SQL");
            assert_eq!(err.params(), Some("[:id => 5]"));
            assert_eq!(
                err.to_string(),
                format!(
                    "Error executing query on database: You have an error in your SQL, \
                     using query: {} and params: [:id => 5]",
                    BY_ID
                )
            );
        }
    }

    #[tokio::test]
    async fn test_error_without_params_says_none() {
        let db = QueryExecutor::new(FakeClient::failing(1146, "Table 'x' doesn't exist"));
        let err = db.select_all("SELECT * FROM x", None).await.unwrap_err();
        assert_eq!(err.params(), Some("(none)"));
        assert!(err.to_string().ends_with("using query: SELECT * FROM x and params: (none)"));
    }

    #[tokio::test]
    async fn test_empty_params_still_goes_through_binding_path() {
        let client = FakeClient::with_users(&["alice"]);
        let db = QueryExecutor::new(&client);

        db.select_all("SELECT * FROM users", Some(&Params::new()))
            .await
            .unwrap();

        assert_eq!(client.calls()[0].params, Some(Params::new()));
    }
}
