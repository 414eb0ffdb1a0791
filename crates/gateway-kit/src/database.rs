//! Database connection setup and traced queries.
//!
//! Uses the sqlx `Any` driver so the backend (Postgres or MySQL) is chosen
//! by the DSN scheme at runtime.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Connection, FromRow};

static SQL_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)").expect("valid placeholder pattern"));

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to open database: {0}")]
    Open(#[source] sqlx::Error),
    #[error("failed to ping database: {0}")]
    Ping(#[source] sqlx::Error),
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Database connection settings.
///
/// When `dsn` is empty it is assembled from the individual fields.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub dsn: String,
    pub driver: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub schema: String,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    /// Log every query and its results at `debug`.
    pub trace: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: String::new(),
            driver: "postgres".to_string(),
            user: String::new(),
            password: String::new(),
            host: "localhost".to_string(),
            schema: String::new(),
            ssl_mode: "disable".to_string(),
            max_connections: 200,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 30 * 60,
            max_lifetime_secs: 60 * 60,
            trace: false,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("trace", &self.trace)
            .finish_non_exhaustive()
    }
}

impl DatabaseConfig {
    pub fn builder() -> crate::ConfigBuilder {
        crate::ConfigBuilder::new()
    }

    pub fn dsn(&self) -> String {
        if !self.dsn.is_empty() {
            return self.dsn.clone();
        }
        format!(
            "{}://{}:{}@{}/{}?sslmode={}",
            self.driver, self.user, self.password, self.host, self.schema, self.ssl_mode
        )
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }
}

/// Create a lazily connecting pool for the configured database.
///
/// No connection is made until first use; call [`ping`] to verify
/// connectivity at startup.
pub fn open_db_connection(config: &DatabaseConfig) -> Result<AnyPool, DatabaseError> {
    sqlx::any::install_default_drivers();

    tracing::debug!(driver = %config.driver, host = %config.host, "Connecting to database...");
    AnyPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect_lazy(&config.dsn())
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to open database");
            DatabaseError::Open(e)
        })
}

/// Acquire a connection and ping the server.
pub async fn ping(pool: &AnyPool) -> Result<(), DatabaseError> {
    let result = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await
    }
    .await;

    result.map_err(|e| {
        tracing::error!(error = %e, "Failed to ping database");
        DatabaseError::Ping(e)
    })
}

/// Close every connection in the pool.
pub async fn close_db_connection(pool: &AnyPool) {
    if pool.is_closed() {
        tracing::warn!("Database pool already closed");
        return;
    }
    pool.close().await;
    tracing::debug!("Database pool closed");
}

/// A positional query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => write!(f, "'{v}'"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Null => f.write_str("NULL"),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SqlParam {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for SqlParam {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Render a query for logging with `$N` placeholders replaced by the N-th
/// parameter. Placeholders without a parameter are left untouched.
pub fn format_query(sql: &str, params: &[SqlParam]) -> String {
    SQL_PARAM
        .replace_all(sql, |caps: &Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|idx| params.get(idx))
                .map_or_else(|| caps[0].to_string(), ToString::to_string)
        })
        .into_owned()
}

/// Runs select queries against a pool, optionally tracing them.
#[derive(Clone)]
pub struct QueryContext {
    pool: AnyPool,
    trace: bool,
}

impl QueryContext {
    pub fn new(pool: AnyPool, trace: bool) -> Self {
        Self { pool, trace }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Run `sql` with positional `params` and map every row into `T`.
    pub async fn select<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, AnyRow> + Send + Unpin + fmt::Debug,
    {
        if self.trace {
            tracing::debug!("SQL Query: {}", format_query(sql, params));
        }

        let mut query = sqlx::query_as::<_, T>(sql);
        for param in params {
            query = match param {
                SqlParam::Text(v) => query.bind(v.clone()),
                SqlParam::Int(v) => query.bind(*v),
                SqlParam::Float(v) => query.bind(*v),
                SqlParam::Bool(v) => query.bind(*v),
                SqlParam::Null => query.bind(None::<String>),
            };
        }

        let rows = query.fetch_all(&self.pool).await?;
        if self.trace {
            tracing::debug!("SQL Results: {:?}", rows);
        }
        Ok(rows)
    }
}
