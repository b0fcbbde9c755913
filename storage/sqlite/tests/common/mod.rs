use std::str::FromStr;

use quarry_ast::{ColumnType, Statement, Table};
use quarry_core::{Adapter, AdapterError, ExecuteRequest};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub fn tasks() -> Table {
    Table::new("tasks")
        .column("id", ColumnType::Integer)
        .column("title", ColumnType::Text)
        .column("done", ColumnType::Boolean)
        .column("due", ColumnType::Timestamp)
        .primary_key(["id"])
}

pub async fn create_tasks(adapter: &impl Adapter) -> Result<(), AdapterError> {
    let ddl = Statement::raw(r#"create table "tasks" ("id" integer primary key, "title" text, "done" boolean, "due" timestamp)"#, vec![]);
    adapter.execute(ExecuteRequest::new(&ddl)).await?;
    Ok(())
}

/// A fresh database file under the system temp directory.
pub fn temp_db_path(name: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("quarry-{}-{}.db", name, std::process::id()));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
    path
}
