use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapter::Adapter;
use crate::error::AdapterError;
use crate::registry::TransactionToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted => "read uncommitted",
            IsolationLevel::ReadCommitted => "read committed",
            IsolationLevel::RepeatableRead => "repeatable read",
            IsolationLevel::Serializable => "serializable",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOptions {
    pub isolation_level: Option<IsolationLevel>,
    pub read_only: bool,
}

impl TransactionOptions {
    pub fn isolation(mut self, level: IsolationLevel) -> Self {
        self.isolation_level = Some(level);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn is_default(&self) -> bool { self.isolation_level.is_none() && !self.read_only }
}

/// Run `f` inside a transaction: commit when it returns `Ok`, roll back when it returns `Err`.
///
/// The closure's error is returned unchanged after the rollback. A failing rollback is logged, not reported.
pub async fn transaction<A, F, Fut, T, E>(adapter: &A, options: TransactionOptions, f: F) -> Result<T, E>
where
    A: Adapter + ?Sized,
    F: FnOnce(TransactionToken) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: From<AdapterError>,
{
    let token = adapter.begin_transaction(options).await?;
    match f(token).await {
        Ok(value) => {
            adapter.commit_transaction(token).await?;
            Ok(value)
        }
        Err(err) => {
            debug!("transaction {} failed, rolling back", token);
            if let Err(rollback_err) = adapter.rollback_transaction(token).await {
                warn!("rollback of transaction {} failed: {}", token, rollback_err);
            }
            Err(err)
        }
    }
}
