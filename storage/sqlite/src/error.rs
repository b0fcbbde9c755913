//! Error types for the SQLite adapter

use quarry_core::AdapterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqliteError {
    #[error("SQLite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl From<SqliteError> for AdapterError {
    fn from(err: SqliteError) -> Self {
        match err {
            // Keep the rusqlite error itself reachable by downcast.
            SqliteError::Rusqlite(err) => AdapterError::driver(err),
            SqliteError::Pool(message) => AdapterError::Pool(message),
            err @ SqliteError::TaskJoin(_) => AdapterError::driver(err),
        }
    }
}
