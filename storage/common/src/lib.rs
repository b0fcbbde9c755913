pub mod adapter;
pub mod compiler;
pub mod dialect;
pub mod driver;

pub use adapter::{MySql, SqlAdapter};
pub use compiler::{compile, CompiledQuery, Compiler, SqlBuilder, SqlExpr};
pub use dialect::{Dialect, IlikeStyle, MySqlDialect, PostgresDialect, SqliteDialect, UpsertStyle};
pub use driver::{Client, Connection, Lease, QueryOutput, SingleConnection};
