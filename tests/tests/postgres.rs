#![cfg(feature = "postgres")]

//! The conformance scenarios against a real Postgres in a container. Needs Docker.

mod common;
mod pg_common;
mod scenarios;

use anyhow::{Context, Result};
use common::*;
use pg_common::create_postgres_container;
use tracing::info;

macro_rules! postgres_conformance {
    ($($scenario:ident),+ $(,)?) => {
        #[tokio::test]
        #[ignore = "requires docker"]
        async fn postgres_matches_reference_scenarios() -> Result<()> {
            let (_container, adapter) = create_postgres_container().await?;
            $(
                info!("{} on Postgres", stringify!($scenario));
                create_schema(&adapter, Flavor::Postgres).await?;
                scenarios::$scenario(&adapter).await.context(stringify!($scenario))?;
            )+
            Ok(())
        }
    };
}

postgres_conformance!(
    pattern_matching,
    insert_assigns_next_key,
    empty_lists,
    comparisons,
    joins,
    ordering_and_paging,
    string_ordering,
    insert_reporting,
    updates_and_deletes,
    upserts,
    transactions,
    savepoints,
    grouping_and_distinct,
);
