//! Postgres adapter: the Postgres dialect running over tokio-postgres.
//!
//! ```no_run
//! # async fn demo() -> Result<(), quarry_core::AdapterError> {
//! let adapter = quarry_storage_postgres::connect("host=localhost user=postgres dbname=app").await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod value;

pub use connection::{PostgresConnection, PostgresPool};

use quarry_core::AdapterError;
use quarry_storage_common::{PostgresDialect, SingleConnection, SqlAdapter};

pub type Postgres<C = PostgresPool> = SqlAdapter<PostgresDialect, C>;

/// Pooled adapter from a libpq-style connection string.
pub async fn connect(config: &str) -> Result<Postgres, AdapterError> { Ok(Postgres::new(PostgresPool::connect(config).await?)) }

/// Adapter over one connection. Transactions share it with top-level statements.
pub async fn connect_single(config: &str) -> Result<Postgres<SingleConnection<PostgresConnection>>, AdapterError> {
    Ok(SqlAdapter::new(SingleConnection::new(PostgresConnection::connect(config).await?)))
}
