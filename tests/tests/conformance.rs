//! Every scenario against the Memory Engine and SQLite. Both must produce the same rows and counts.

mod common;
mod scenarios;

use anyhow::{Context, Result};
use common::*;
use tracing::info;

macro_rules! conformance {
    ($($scenario:ident),+ $(,)?) => {
        $(
            #[tokio::test]
            async fn $scenario() -> Result<()> {
                for backend in backends().await? {
                    info!("{} on {:?}", stringify!($scenario), backend.flavor);
                    scenarios::$scenario(&*backend.adapter).await.with_context(|| format!("{:?} backend", backend.flavor))?;
                }
                Ok(())
            }
        )+
    };
}

conformance!(
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

#[tokio::test]
async fn fresh_insert_is_found_case_insensitively() -> Result<()> {
    use quarry_ast::build::ilike;
    use quarry_ast::{row, ReadStatement, Statement};
    use quarry_core::ExecuteRequest;

    for backend in backends().await? {
        let adapter = &*backend.adapter;
        let insert = Statement::insert(accounts(), row! { "email" => "Zed@Quarry.example", "age" => 30, "active" => true, "created_at" => day(6, 1) });
        adapter.execute(ExecuteRequest::new(&insert)).await?;
        let found = count(adapter, ReadStatement::new(accounts()).filter(ilike("email", "%quarry%")), None).await?;
        assert_eq!(found, Some(1), "{:?}", backend.flavor);
    }
    Ok(())
}
