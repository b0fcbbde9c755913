//! Connection manager for bb8 pool with rusqlite, and the driver binding on top of it

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use quarry_ast::{Row, Value};
use quarry_core::AdapterError;
use quarry_storage_common::{Client, Connection, Lease, QueryOutput};
use rusqlite::params_from_iter;
use tokio::sync::Mutex;

use crate::error::SqliteError;
use crate::value::{from_sqlite, to_sqlite, ColumnKind};

/// Configuration for SQLite connections
#[derive(Clone, Debug)]
pub enum SqliteConfig {
    /// File-based database
    File(PathBuf),
    /// In-memory database (for testing)
    Memory,
}

/// bb8 connection manager for rusqlite connections.
pub struct SqliteConnectionManager {
    config: SqliteConfig,
}

impl SqliteConnectionManager {
    pub fn new(config: SqliteConfig) -> Self { Self { config } }

    pub fn file(path: impl Into<PathBuf>) -> Self { Self::new(SqliteConfig::File(path.into())) }

    pub fn memory() -> Self { Self::new(SqliteConfig::Memory) }

    pub fn create_connection(&self) -> Result<rusqlite::Connection, SqliteError> {
        let conn = match &self.config {
            SqliteConfig::File(path) => rusqlite::Connection::open(path)?,
            SqliteConfig::Memory => rusqlite::Connection::open_in_memory()?,
        };

        // `like` is case-sensitive everywhere else; `ilike` is rendered as lower() like lower().
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA case_sensitive_like=ON;
             PRAGMA temp_store=MEMORY;",
        )?;

        Ok(conn)
    }
}

/// A rusqlite connection usable from async code.
///
/// rusqlite calls are synchronous, so every operation locks the connection inside `spawn_blocking`.
#[derive(Clone)]
pub struct SqliteHandle {
    inner: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteHandle {
    pub fn new(conn: rusqlite::Connection) -> Self { Self { inner: Arc::new(Mutex::new(conn)) } }

    pub async fn with_connection<F, T>(&self, f: F) -> Result<T, SqliteError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, SqliteError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.blocking_lock();
            f(&guard)
        })
        .await
        .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
    }
}

impl bb8::ManageConnection for SqliteConnectionManager {
    type Connection = SqliteHandle;
    type Error = SqliteError;

    fn connect(&self) -> impl std::future::Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let config = self.config.clone();
        async move {
            let manager = SqliteConnectionManager::new(config);
            tokio::task::spawn_blocking(move || manager.create_connection().map(SqliteHandle::new))
                .await
                .map_err(|e| SqliteError::TaskJoin(e.to_string()))?
        }
    }

    #[allow(refining_impl_trait)]
    fn is_valid<'a, 'b>(&'a self, conn: &'b mut Self::Connection) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send {
        let conn = conn.clone();
        async move { conn.with_connection(|c| c.execute_batch("SELECT 1").map_err(SqliteError::from)).await }
    }

    fn has_broken(&self, _conn: &mut Self::Connection) -> bool { false }
}

/// Run one statement. Statements without result columns report affected rows and the last rowid.
fn run(conn: &rusqlite::Connection, sql: &str, values: &[Value]) -> Result<QueryOutput, SqliteError> {
    let mut stmt = conn.prepare(sql)?;
    let params = values.iter().map(to_sqlite);

    if stmt.column_count() == 0 {
        let affected_rows = stmt.execute(params_from_iter(params))?;
        return Ok(QueryOutput::Written { affected_rows: affected_rows as u64, last_insert_id: Some(Value::Integer(conn.last_insert_rowid())) });
    }

    let columns: Vec<(String, ColumnKind)> =
        stmt.columns().iter().map(|column| (column.name().to_owned(), ColumnKind::from_decl_type(column.decl_type()))).collect();
    let mut rows = stmt.query(params_from_iter(params))?;
    let mut output = Vec::new();
    while let Some(row) = rows.next()? {
        let mut decoded = Row::with_capacity(columns.len());
        for (index, (name, kind)) in columns.iter().enumerate() {
            decoded.insert(name.clone(), from_sqlite(row.get_ref(index)?, *kind));
        }
        output.push(decoded);
    }
    Ok(QueryOutput::Rows(output))
}

pub enum SqliteConnection {
    Pooled(bb8::PooledConnection<'static, SqliteConnectionManager>),
    Direct(SqliteHandle),
}

impl SqliteConnection {
    fn handle(&self) -> &SqliteHandle {
        match self {
            SqliteConnection::Pooled(conn) => &**conn,
            SqliteConnection::Direct(handle) => handle,
        }
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> {
        let (sql, values) = (sql.to_owned(), values.to_vec());
        Ok(self.handle().with_connection(move |conn| run(conn, &sql, &values)).await?)
    }

    async fn batch(&self, sql: &str) -> Result<(), AdapterError> {
        let sql = sql.to_owned();
        Ok(self.handle().with_connection(move |conn| conn.execute_batch(&sql).map_err(SqliteError::from)).await?)
    }
}

/// A pool of file-backed connections, or the single connection of an in-memory database.
///
/// An in-memory database lives and dies with its connection, so it is never pooled. Its transactions share the
/// connection with top-level statements.
pub enum SqliteClient {
    Pool(bb8::Pool<SqliteConnectionManager>),
    Single(Arc<SqliteConnection>),
}

impl SqliteClient {
    async fn pooled(pool: &bb8::Pool<SqliteConnectionManager>) -> Result<SqliteConnection, AdapterError> {
        let conn = pool.get_owned().await.map_err(|e| SqliteError::Pool(e.to_string()))?;
        Ok(SqliteConnection::Pooled(conn))
    }
}

#[async_trait]
impl Client for SqliteClient {
    type Connection = SqliteConnection;

    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> {
        match self {
            SqliteClient::Pool(pool) => Self::pooled(pool).await?.query(sql, values).await,
            SqliteClient::Single(conn) => conn.query(sql, values).await,
        }
    }

    async fn acquire(&self) -> Result<Lease<SqliteConnection>, AdapterError> {
        match self {
            SqliteClient::Pool(pool) => Ok(Lease::Dedicated(Self::pooled(pool).await?)),
            SqliteClient::Single(conn) => Ok(Lease::Shared(conn.clone())),
        }
    }
}
