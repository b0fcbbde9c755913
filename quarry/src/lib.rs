//! # Quarry
//!
//! Quarry describes database operations as plain data ([`Statement`]s built from [`Predicate`]s) and runs them
//! against interchangeable adapters.
//!
//! ## Key Features
//!
//! - **One statement model**: selects, counts, joins, writes and upserts expressed once, without SQL strings
//! - **Dialect compilers**: Postgres, MySQL and SQLite renderings with positional parameters
//! - **Transactions by token**: begin, commit, rollback and savepoints through an opaque [`TransactionToken`]
//! - **Reference engine**: [`MemoryEngine`] interprets statements directly and defines the expected results
//!
//! ## Example
//!
//! ```rust
//! # use quarry::{row, build::*, Adapter, ColumnType, ExecuteRequest, MemoryEngine, ReadStatement, Statement, Table};
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let accounts = Table::new("accounts").column("id", ColumnType::Integer).column("email", ColumnType::Text).primary_key(["id"]);
//! let engine = MemoryEngine::new();
//!
//! let insert = Statement::insert(accounts.clone(), row! { "email" => "ada@example.com" });
//! let inserted = engine.execute(ExecuteRequest::new(&insert)).await?;
//! assert_eq!(inserted.insert_id, Some(1.into()));
//!
//! let count = Statement::Count(ReadStatement::new(accounts).filter(ilike("email", "%EXAMPLE%")));
//! assert_eq!(engine.execute(ExecuteRequest::new(&count)).await?.count(), Some(1));
//! # Ok(())
//! # }
//! ```
//!
//! The same statements compile to SQL for any [`Dialect`]:
//!
//! ```rust
//! # use quarry::{build::*, compile, ColumnType, PostgresDialect, ReadStatement, SelectStatement, Statement, Table};
//! let accounts = Table::new("accounts").column("id", ColumnType::Integer);
//! let select = SelectStatement::new(ReadStatement::new(accounts).filter(in_list("id", [1, 2])));
//! let query = compile(&PostgresDialect, &Statement::Select(select)).unwrap();
//! assert_eq!(query.text, r#"select * from "accounts" where "id" in ($1, $2)"#);
//! ```

pub use quarry_ast as ast;
pub use quarry_core as core;
pub use quarry_storage_common as common;
pub use quarry_storage_memory as memory;
#[cfg(feature = "postgres")]
pub use quarry_storage_postgres as postgres;
#[cfg(feature = "sqlite")]
pub use quarry_storage_sqlite as sqlite;

// Re-export commonly used types
pub use quarry_ast::{
    build, row, ColumnType, Join, JoinKind, OrderDirection, Predicate, Projection, ReadStatement, Returning, Row, SelectStatement,
    Statement, Table, Value,
};
pub use quarry_core::{
    transaction, Adapter, AdapterCapabilities, AdapterError, AdapterResult, CapabilityOverrides, ExecuteRequest, IsolationLevel,
    TransactionOptions, TransactionToken,
};
pub use quarry_storage_common::{compile, CompiledQuery, Dialect, MySqlDialect, PostgresDialect, SqlAdapter, SqliteDialect};
pub use quarry_storage_memory::MemoryEngine;
