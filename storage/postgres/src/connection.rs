use async_trait::async_trait;
use bb8_postgres::PostgresConnectionManager;
use quarry_ast::Value;
use quarry_core::AdapterError;
use quarry_storage_common::{Client, Connection, Lease, QueryOutput};
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;
use tracing::error;

use crate::value::{decode_row, params};

type Manager = PostgresConnectionManager<NoTls>;

fn pool_error(err: bb8::RunError<tokio_postgres::Error>) -> AdapterError {
    match err {
        bb8::RunError::User(err) => AdapterError::driver(err),
        bb8::RunError::TimedOut => AdapterError::Pool("timed out waiting for a postgres connection".to_owned()),
    }
}

/// Prepare first, then pick `query` or `execute` depending on whether the statement yields columns.
async fn run(client: &tokio_postgres::Client, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> {
    let statement = client.prepare(sql).await.map_err(AdapterError::driver)?;
    let params = params(values);
    let args: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

    if statement.columns().is_empty() {
        let affected_rows = client.execute(&statement, &args).await.map_err(AdapterError::driver)?;
        Ok(QueryOutput::Written { affected_rows, last_insert_id: None })
    } else {
        let rows = client.query(&statement, &args).await.map_err(AdapterError::driver)?;
        Ok(QueryOutput::Rows(rows.iter().map(decode_row).collect::<Result<_, _>>()?))
    }
}

/// A bb8 pool of Postgres connections. Every transaction gets a dedicated connection.
#[derive(Clone)]
pub struct PostgresPool {
    pool: bb8::Pool<Manager>,
}

impl PostgresPool {
    pub fn new(pool: bb8::Pool<Manager>) -> Self { Self { pool } }

    /// Build a pool from a libpq-style connection string such as `host=localhost user=postgres`.
    pub async fn connect(config: &str) -> Result<Self, AdapterError> {
        let manager = PostgresConnectionManager::new_from_stringlike(config, NoTls).map_err(AdapterError::driver)?;
        let pool = bb8::Pool::builder().build(manager).await.map_err(AdapterError::driver)?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &bb8::Pool<Manager> { &self.pool }

    async fn get(&self) -> Result<bb8::PooledConnection<'static, Manager>, AdapterError> { self.pool.get_owned().await.map_err(pool_error) }
}

#[async_trait]
impl Client for PostgresPool {
    type Connection = PostgresConnection;

    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> {
        let conn = self.get().await?;
        run(&conn, sql, values).await
    }

    async fn acquire(&self) -> Result<Lease<PostgresConnection>, AdapterError> { Ok(Lease::Dedicated(PostgresConnection::Pooled(self.get().await?))) }
}

pub enum PostgresConnection {
    /// Checked out of a [`PostgresPool`], returned when dropped.
    Pooled(bb8::PooledConnection<'static, Manager>),
    /// A client whose connection task is driven elsewhere.
    Direct(tokio_postgres::Client),
}

impl PostgresConnection {
    /// Open a single connection and drive it on a background task.
    pub async fn connect(config: &str) -> Result<Self, AdapterError> {
        let (client, connection) = tokio_postgres::connect(config, NoTls).await.map_err(AdapterError::driver)?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                error!("postgres connection closed: {}", err);
            }
        });
        Ok(PostgresConnection::Direct(client))
    }

    pub fn client(&self) -> &tokio_postgres::Client {
        match self {
            PostgresConnection::Pooled(conn) => &**conn,
            PostgresConnection::Direct(client) => client,
        }
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> { run(self.client(), sql, values).await }

    async fn batch(&self, sql: &str) -> Result<(), AdapterError> { self.client().batch_execute(sql).await.map_err(AdapterError::driver) }
}
