#![cfg(feature = "postgres")]

use anyhow::Result;
use quarry_storage_postgres::{Postgres, PostgresPool};
use testcontainers::ContainerAsync;
use testcontainers_modules::{postgres, testcontainers::runners::AsyncRunner};

pub async fn create_postgres_container() -> Result<(ContainerAsync<postgres::Postgres>, Postgres)> {
    let container: ContainerAsync<postgres::Postgres> = postgres::Postgres::default()
        .with_db_name("quarry")
        .with_user("postgres")
        .with_password("postgres")
        // if you want to inspect the container
        // .with_container_name("quarry_pg")
        // .with_reuse(testcontainers::ReuseDirective::Always)
        .start()
        .await?;

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let pool = PostgresPool::connect(&format!("host={host} port={port} user=postgres password=postgres dbname=quarry")).await?;

    Ok((container, Postgres::new(pool)))
}
