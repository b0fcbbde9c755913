//! Statement and predicate model shared by every Quarry adapter.
//!
//! A [`Statement`] describes one database operation as plain data. It is built once by the query
//! builder, handed to an adapter by reference, and never mutated afterwards. SQL adapters compile it
//! to dialect text; the memory engine interprets it directly.

pub mod ast;
pub mod build;
pub mod value;

pub use ast::*;
pub use value::{Row, Value};
