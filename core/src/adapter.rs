use std::sync::Arc;

use async_trait::async_trait;
use quarry_ast::Statement;
use serde::{Deserialize, Serialize};

use crate::error::AdapterError;
use crate::registry::TransactionToken;
use crate::result::AdapterResult;
use crate::transaction::TransactionOptions;

/// A statement plus the transaction it should run in. Without a token the statement runs at top level.
#[derive(Debug, Clone, Copy)]
pub struct ExecuteRequest<'a> {
    pub statement: &'a Statement,
    pub transaction: Option<TransactionToken>,
}

impl<'a> ExecuteRequest<'a> {
    pub fn new(statement: &'a Statement) -> Self { Self { statement, transaction: None } }

    pub fn in_transaction(statement: &'a Statement, token: TransactionToken) -> Self { Self { statement, transaction: Some(token) } }
}

impl<'a> From<&'a Statement> for ExecuteRequest<'a> {
    fn from(statement: &'a Statement) -> Self { Self::new(statement) }
}

/// What an adapter can do natively. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterCapabilities {
    pub returning: bool,
    pub savepoints: bool,
    pub upsert: bool,
}

impl AdapterCapabilities {
    pub const ALL: AdapterCapabilities = AdapterCapabilities { returning: true, savepoints: true, upsert: true };

    pub fn with_overrides(self, overrides: &CapabilityOverrides) -> Self {
        Self {
            returning: overrides.returning.unwrap_or(self.returning),
            savepoints: overrides.savepoints.unwrap_or(self.savepoints),
            upsert: overrides.upsert.unwrap_or(self.upsert),
        }
    }
}

/// Construction-time adjustments to a dialect's default capabilities, typically loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityOverrides {
    pub returning: Option<bool>,
    pub savepoints: Option<bool>,
    pub upsert: Option<bool>,
}

#[async_trait]
pub trait Adapter: Send + Sync {
    async fn execute(&self, request: ExecuteRequest<'_>) -> Result<AdapterResult, AdapterError>;

    async fn begin_transaction(&self, options: TransactionOptions) -> Result<TransactionToken, AdapterError>;

    /// Commit and retire the token. The token is retired even if the commit fails.
    async fn commit_transaction(&self, token: TransactionToken) -> Result<(), AdapterError>;

    /// Roll back and retire the token. The token is retired even if the rollback fails.
    async fn rollback_transaction(&self, token: TransactionToken) -> Result<(), AdapterError>;

    async fn create_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError>;

    async fn rollback_to_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError>;

    async fn release_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError>;

    fn capabilities(&self) -> AdapterCapabilities;
}

#[async_trait]
impl<A: Adapter + ?Sized> Adapter for Arc<A> {
    async fn execute(&self, request: ExecuteRequest<'_>) -> Result<AdapterResult, AdapterError> { (**self).execute(request).await }

    async fn begin_transaction(&self, options: TransactionOptions) -> Result<TransactionToken, AdapterError> {
        (**self).begin_transaction(options).await
    }

    async fn commit_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> { (**self).commit_transaction(token).await }

    async fn rollback_transaction(&self, token: TransactionToken) -> Result<(), AdapterError> { (**self).rollback_transaction(token).await }

    async fn create_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        (**self).create_savepoint(token, name).await
    }

    async fn rollback_to_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        (**self).rollback_to_savepoint(token, name).await
    }

    async fn release_savepoint(&self, token: TransactionToken, name: &str) -> Result<(), AdapterError> {
        (**self).release_savepoint(token, name).await
    }

    fn capabilities(&self) -> AdapterCapabilities { (**self).capabilities() }
}
