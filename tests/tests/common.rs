use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use quarry_ast::{row, ColumnType, ReadStatement, Row, SelectStatement, Statement, Table};
use quarry_core::{Adapter, ExecuteRequest, TransactionToken};
use quarry_storage_memory::MemoryEngine;
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

/// Which engine a backend runs on, for the DDL each needs before seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Memory,
    Sqlite,
    #[allow(unused)]
    Postgres,
}

impl Flavor {
    fn ddl(self) -> &'static [&'static str] {
        match self {
            Flavor::Memory => &[],
            Flavor::Sqlite => &[
                r#"create table "accounts" ("id" integer primary key, "email" text not null, "age" integer, "active" boolean, "created_at" timestamp)"#,
                r#"create table "projects" ("id" integer primary key, "account_id" integer, "title" text not null, "priority" integer)"#,
            ],
            Flavor::Postgres => &[
                r#"drop table if exists "accounts""#,
                r#"drop table if exists "projects""#,
                r#"create table "accounts" ("id" bigserial primary key, "email" text collate "C" not null, "age" integer, "active" boolean, "created_at" timestamptz)"#,
                r#"create table "projects" ("id" bigserial primary key, "account_id" bigint, "title" text collate "C" not null, "priority" integer)"#,
            ],
        }
    }
}

pub struct Backend {
    pub flavor: Flavor,
    pub adapter: Box<dyn Adapter>,
}

pub fn accounts() -> Table {
    Table::new("accounts")
        .column("id", ColumnType::Integer)
        .column("email", ColumnType::Text)
        .column("age", ColumnType::Integer)
        .column("active", ColumnType::Boolean)
        .column("created_at", ColumnType::Timestamp)
        .primary_key(["id"])
}

pub fn projects() -> Table {
    Table::new("projects")
        .column("id", ColumnType::Integer)
        .column("account_id", ColumnType::Integer)
        .column("title", ColumnType::Text)
        .column("priority", ColumnType::Integer)
        .primary_key(["id"])
}

pub fn day(month: u32, day: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, month, day, 12, 0, 0).unwrap() }

/// Create the tables and insert the shared fixture. Keys are assigned by each backend: accounts 1..=3, projects 1..=4.
pub async fn create_schema(adapter: &dyn Adapter, flavor: Flavor) -> Result<()> {
    for ddl in flavor.ddl() {
        adapter.execute(ExecuteRequest::new(&Statement::raw(*ddl, vec![]))).await?;
    }

    let people = Statement::insert_many(
        accounts(),
        vec![
            row! { "email" => "ada@example.com", "age" => 36, "active" => true, "created_at" => day(1, 1) },
            row! { "email" => "Bob@Example.com", "age" => 41, "active" => false, "created_at" => day(2, 1) },
            row! { "email" => "cy@sample.org", "age" => quarry_ast::Value::Null, "active" => true, "created_at" => day(3, 1) },
        ],
    );
    adapter.execute(ExecuteRequest::new(&people)).await?;

    let work = Statement::insert_many(
        projects(),
        vec![
            row! { "account_id" => 1, "title" => "engine", "priority" => 2 },
            row! { "account_id" => 1, "title" => "loom", "priority" => quarry_ast::Value::Null },
            row! { "account_id" => 2, "title" => "ledger", "priority" => 1 },
            row! { "account_id" => 9, "title" => "orphan", "priority" => 3 },
        ],
    );
    adapter.execute(ExecuteRequest::new(&work)).await?;
    Ok(())
}

/// The Memory Engine and an in-memory SQLite database, both seeded identically.
pub async fn backends() -> Result<Vec<Backend>> {
    let memory = Backend { flavor: Flavor::Memory, adapter: Box::new(MemoryEngine::new()) };
    let sqlite = Backend { flavor: Flavor::Sqlite, adapter: Box::new(quarry_storage_sqlite::open_in_memory().await?) };

    let backends = vec![memory, sqlite];
    for backend in &backends {
        create_schema(&*backend.adapter, backend.flavor).await?;
    }
    Ok(backends)
}

pub async fn count(adapter: &dyn Adapter, read: ReadStatement, token: Option<TransactionToken>) -> Result<Option<i64>> {
    let statement = Statement::Count(read);
    Ok(adapter.execute(ExecuteRequest { statement: &statement, transaction: token }).await?.count())
}

pub async fn select(adapter: &dyn Adapter, select: SelectStatement) -> Result<Vec<Row>> {
    let statement = Statement::Select(select);
    Ok(adapter.execute(ExecuteRequest::new(&statement)).await?.into_rows())
}
