use std::str::FromStr;

use chrono::{TimeZone, Utc};
use quarry_ast::{row, ColumnType, Table};
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

pub fn events() -> Table {
    Table::new("events")
        .column("id", ColumnType::Integer)
        .column("name", ColumnType::Text)
        .column("venue", ColumnType::Text)
        .column("starts_at", ColumnType::Timestamp)
        .column("capacity", ColumnType::Integer)
        .primary_key(["id"])
}

pub fn seeded() -> MemoryEngine {
    let engine = MemoryEngine::new();
    let at = |day: u32| Utc.with_ymd_and_hms(2024, 5, day, 18, 0, 0).unwrap();
    engine.seed(
        "events",
        [
            row! { "id" => 1, "name" => "Rust Meetup", "venue" => "Hall A", "starts_at" => at(3), "capacity" => 80 },
            row! { "id" => 2, "name" => "rust workshop", "venue" => "Hall B", "starts_at" => at(1), "capacity" => 20 },
            row! { "id" => 3, "name" => "Go Night", "venue" => "Hall A", "starts_at" => at(2), "capacity" => Value::Null },
            row! { "id" => 4, "name" => "Zig Talk", "venue" => Value::Null, "starts_at" => at(4), "capacity" => 150 },
        ],
    );
    engine
}

pub use quarry_ast::Value;
