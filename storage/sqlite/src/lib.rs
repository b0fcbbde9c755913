//! SQLite adapter for Quarry
//!
//! Runs the SQLite dialect over rusqlite. File databases use a bb8 pool and give every transaction its own
//! connection; in-memory databases use one shared connection.
//!
//! # Example
//!
//! ```rust,ignore
//! // Open a file-based database
//! let adapter = quarry_storage_sqlite::open("myapp.db").await?;
//!
//! // Or use an in-memory database for testing
//! let adapter = quarry_storage_sqlite::open_in_memory().await?;
//! ```

mod connection;
mod error;
pub mod value;

use std::path::Path;
use std::sync::Arc;

pub use connection::{SqliteClient, SqliteConfig, SqliteConnection, SqliteConnectionManager, SqliteHandle};
pub use error::SqliteError;

use quarry_core::AdapterError;
use quarry_storage_common::{SqlAdapter, SqliteDialect};

pub type Sqlite = SqlAdapter<SqliteDialect, SqliteClient>;

/// Default maximum number of pooled connections for file databases
pub const DEFAULT_POOL_SIZE: u32 = 10;

pub async fn open(path: impl AsRef<Path>) -> Result<Sqlite, AdapterError> {
    let manager = SqliteConnectionManager::file(path.as_ref());
    let pool = bb8::Pool::builder().max_size(DEFAULT_POOL_SIZE).build(manager).await?;
    Ok(Sqlite::new(SqliteClient::Pool(pool)))
}

pub async fn open_in_memory() -> Result<Sqlite, AdapterError> {
    let manager = SqliteConnectionManager::memory();
    let handle = tokio::task::spawn_blocking(move || manager.create_connection().map(SqliteHandle::new))
        .await
        .map_err(|e| SqliteError::TaskJoin(e.to_string()))??;
    Ok(Sqlite::new(SqliteClient::Single(Arc::new(SqliteConnection::Direct(handle)))))
}
