//! The contract every Quarry adapter implements.
//!
//! Adapters receive immutable [`Statement`](quarry_ast::Statement)s through [`ExecuteRequest`], return a
//! normalized [`AdapterResult`], and manage transactions through opaque [`TransactionToken`]s.

pub mod adapter;
pub mod error;
pub mod registry;
pub mod result;
pub mod transaction;

pub use adapter::{Adapter, AdapterCapabilities, CapabilityOverrides, ExecuteRequest};
pub use error::AdapterError;
pub use registry::{Registry, TransactionToken};
pub use result::{AdapterResult, COUNT_COLUMN};
pub use transaction::{transaction, IsolationLevel, TransactionOptions};

pub use quarry_ast as ast;
