//! Common utilities for Postgres adapter tests

use std::str::FromStr;

use anyhow::Result;
use quarry_storage_postgres::{Postgres, PostgresPool};
use testcontainers::ContainerAsync;
use testcontainers_modules::{postgres, testcontainers::runners::AsyncRunner};
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub async fn create_postgres_container() -> Result<(ContainerAsync<postgres::Postgres>, Postgres)> {
    let container: ContainerAsync<postgres::Postgres> =
        postgres::Postgres::default().with_db_name("quarry").with_user("postgres").with_password("postgres").start().await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let pool = PostgresPool::connect(&format!("host={host} port={port} user=postgres password=postgres dbname=quarry")).await?;

    Ok((container, Postgres::new(pool)))
}
