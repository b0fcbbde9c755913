//! The boundary between [`SqlAdapter`](crate::SqlAdapter) and a database driver.

use std::sync::Arc;

use async_trait::async_trait;
use quarry_ast::{Row, Value};
use quarry_core::AdapterError;

/// What a driver reports for one statement. The driver decides which shape applies by inspecting the prepared
/// statement: statements that produce result columns yield rows, everything else reports written rows.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Row>),
    Written { affected_rows: u64, last_insert_id: Option<Value> },
}

/// One database session. Transactions run on a single connection from `begin` to `commit`/`rollback`.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError>;

    /// Run one or more statements without parameters or results.
    async fn batch(&self, sql: &str) -> Result<(), AdapterError>;

    async fn commit(&self) -> Result<(), AdapterError> { self.batch("commit").await }

    async fn rollback(&self) -> Result<(), AdapterError> { self.batch("rollback").await }

    /// Called once a dedicated connection's transaction has ended. Pooled connections also return to their pool
    /// when dropped.
    async fn release(&self) {}
}

/// A connection handed out for the duration of a transaction.
pub enum Lease<C> {
    /// Exclusively held, released when the transaction ends. Pools hand these out.
    Dedicated(C),
    /// The client's only connection, shared with top-level statements.
    Shared(Arc<C>),
}

/// Top-level entry point of a driver: a pool or a single connection.
#[async_trait]
pub trait Client: Send + Sync + 'static {
    type Connection: Connection;

    /// Run a statement outside of any transaction.
    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError>;

    async fn acquire(&self) -> Result<Lease<Self::Connection>, AdapterError>;
}

/// A [`Client`] backed by one connection. Transactions share it with top-level statements.
pub struct SingleConnection<C>(Arc<C>);

impl<C> SingleConnection<C> {
    pub fn new(connection: C) -> Self { Self(Arc::new(connection)) }

    pub fn connection(&self) -> &C { &self.0 }
}

impl<C> Clone for SingleConnection<C> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

#[async_trait]
impl<C: Connection> Client for SingleConnection<C> {
    type Connection = C;

    async fn query(&self, sql: &str, values: &[Value]) -> Result<QueryOutput, AdapterError> { self.0.query(sql, values).await }

    async fn acquire(&self) -> Result<Lease<C>, AdapterError> { Ok(Lease::Shared(self.0.clone())) }
}
