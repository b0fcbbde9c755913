use thiserror::Error;

use crate::registry::TransactionToken;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(TransactionToken),
    #[error("Unknown savepoint: {0}")]
    UnknownSavepoint(String),
    #[error("Invalid statement: {0}")]
    InvalidStatement(String),
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
    #[error("Connection pool error: {0}")]
    Pool(String),
    /// The driver's own error, passed through untouched.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl AdapterError {
    pub fn driver(err: impl std::error::Error + Send + Sync + 'static) -> Self { AdapterError::Driver(Box::new(err)) }

    pub fn invalid(message: impl Into<String>) -> Self { AdapterError::InvalidStatement(message.into()) }

    /// Returns the driver error if it is of type `E`.
    pub fn downcast_driver<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            AdapterError::Driver(err) => err.downcast_ref::<E>(),
            _ => None,
        }
    }
}
