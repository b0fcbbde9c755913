//! In-memory execution of quarry statements.
//!
//! [`MemoryEngine`] interprets statements directly over rows held in memory. It backs unit tests and serves as the
//! reference behavior the SQL adapters are compared against.

mod engine;
pub mod filtering;
mod mutation;
pub mod pipeline;
pub mod sorting;
mod store;

pub use engine::MemoryEngine;
pub use store::Store;
