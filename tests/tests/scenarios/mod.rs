//! Scenarios every adapter must agree on. Each runs against a freshly created and seeded schema.

use anyhow::{anyhow, Result};
use quarry_ast::build::*;
use quarry_ast::{row, JoinKind, OrderDirection, Predicate, ReadStatement, Returning, Row, SelectStatement, Statement, Value};
use quarry_core::{transaction, Adapter, AdapterError, ExecuteRequest, IsolationLevel, TransactionOptions};

use crate::common::*;

fn column<'a>(rows: &'a [Row], name: &str) -> Vec<&'a Value> { rows.iter().map(|row| &row[name]).collect() }

fn emails(rows: &[Row]) -> Vec<Value> { rows.iter().map(|row| row["email"].clone()).collect() }

async fn count_accounts(adapter: &dyn Adapter, predicate: Predicate) -> Result<Option<i64>> {
    count(adapter, ReadStatement::new(accounts()).filter(predicate), None).await
}

pub async fn pattern_matching(adapter: &dyn Adapter) -> Result<()> {
    assert_eq!(count_accounts(adapter, ilike("email", "%EXAMPLE%")).await?, Some(2));
    assert_eq!(count_accounts(adapter, like("email", "%Example%")).await?, Some(1));
    assert_eq!(count_accounts(adapter, like("email", "%.org")).await?, Some(1));
    assert_eq!(count_accounts(adapter, like("email", "_o_@%")).await?, Some(1));
    Ok(())
}

pub async fn insert_assigns_next_key(adapter: &dyn Adapter) -> Result<()> {
    let values = row! { "email" => "dee@example.com", "age" => 29, "active" => true, "created_at" => day(4, 1) };
    let result = adapter.execute(ExecuteRequest::new(&Statement::insert(accounts(), values.clone()))).await?;
    assert_eq!(result.insert_id, Some(Value::Integer(4)));
    assert_eq!(result.affected_rows, Some(1));
    assert_eq!(result.rows, None);

    let reread = select(adapter, SelectStatement::new(ReadStatement::new(accounts()).filter(eq("id", 4)))).await?;
    let mut expected = values;
    expected.insert("id".into(), Value::Integer(4));
    assert_eq!(reread, vec![expected]);

    let batch = Statement::insert_many(projects(), vec![row! { "account_id" => 4, "title" => "a" }, row! { "account_id" => 4, "title" => "b" }]);
    assert_eq!(adapter.execute(ExecuteRequest::new(&batch)).await?.affected_rows, Some(2));
    assert_eq!(count(adapter, ReadStatement::new(projects()).filter(eq("account_id", 4)), None).await?, Some(2));
    Ok(())
}

pub async fn empty_lists(adapter: &dyn Adapter) -> Result<()> {
    assert_eq!(count_accounts(adapter, in_list("id", Vec::<i64>::new())).await?, Some(0));
    assert_eq!(count_accounts(adapter, not_in("id", Vec::<i64>::new())).await?, Some(3));
    assert_eq!(count_accounts(adapter, not_in("id", [1, 2])).await?, Some(1));
    assert_eq!(count_accounts(adapter, in_list("email", ["ada@example.com", "cy@sample.org"])).await?, Some(2));

    let empty = Statement::insert_many(projects(), vec![]);
    assert_eq!(adapter.execute(ExecuteRequest::new(&empty)).await?.affected_rows, Some(0));
    Ok(())
}

pub async fn comparisons(adapter: &dyn Adapter) -> Result<()> {
    assert_eq!(count_accounts(adapter, between("age", 36, 41)).await?, Some(2));
    assert_eq!(count_accounts(adapter, or([eq("email", "cy@sample.org"), gt("age", 40)])).await?, Some(2));
    assert_eq!(count_accounts(adapter, and([is_not_null("age"), lt("age", 40)])).await?, Some(1));
    // Null ages match neither side.
    assert_eq!(count_accounts(adapter, ne("age", 36)).await?, Some(1));
    assert_eq!(count_accounts(adapter, eq("age", Value::Null)).await?, Some(1));
    assert_eq!(count_accounts(adapter, eq("active", true)).await?, Some(2));
    assert_eq!(count_accounts(adapter, gt("created_at", day(1, 15))).await?, Some(2));

    let exists = |predicate| Statement::Exists(ReadStatement::new(accounts()).filter(predicate));
    assert_eq!(adapter.execute(ExecuteRequest::new(&exists(eq("email", "nobody@example.com")))).await?.exists(), Some(false));
    assert_eq!(adapter.execute(ExecuteRequest::new(&exists(eq("active", false)))).await?.exists(), Some(true));
    Ok(())
}

pub async fn joins(adapter: &dyn Adapter) -> Result<()> {
    let joined = |kind| {
        SelectStatement::new(ReadStatement::new(accounts()).join(kind, projects(), eq_column("accounts.id", "projects.account_id")))
            .column("accounts.email")
            .column("projects.title")
            .order_by("accounts.id", OrderDirection::Asc)
            .order_by("projects.id", OrderDirection::Asc)
    };
    let pair = |email: Value, title: Value| row! { "email" => email, "title" => title };
    let (ada, bob, cy) = (Value::from("ada@example.com"), Value::from("Bob@Example.com"), Value::from("cy@sample.org"));
    let matched =
        vec![pair(ada.clone(), "engine".into()), pair(ada.clone(), "loom".into()), pair(bob.clone(), "ledger".into())];

    assert_eq!(select(adapter, joined(JoinKind::Inner)).await?, matched);

    let mut left = matched.clone();
    left.push(pair(cy.clone(), Value::Null));
    assert_eq!(select(adapter, joined(JoinKind::Left)).await?, left);

    let mut right = vec![pair(Value::Null, "orphan".into())];
    right.extend(matched.iter().cloned());
    assert_eq!(select(adapter, joined(JoinKind::Right)).await?, right);

    let mut full = right.clone();
    full.push(pair(cy, Value::Null));
    assert_eq!(select(adapter, joined(JoinKind::Full)).await?, full);

    let urgent = ReadStatement::new(accounts())
        .join(JoinKind::Inner, projects(), eq_column("accounts.id", "projects.account_id"))
        .filter(gt("projects.priority", 1));
    assert_eq!(count(adapter, urgent, None).await?, Some(1));
    Ok(())
}

pub async fn ordering_and_paging(adapter: &dyn Adapter) -> Result<()> {
    let by_age = |direction| SelectStatement::new(ReadStatement::new(accounts())).column("email").order_by("age", direction);

    let ascending = select(adapter, by_age(OrderDirection::Asc)).await?;
    assert_eq!(emails(&ascending), vec![Value::from("cy@sample.org"), "ada@example.com".into(), "Bob@Example.com".into()]);

    let descending = select(adapter, by_age(OrderDirection::Desc)).await?;
    assert_eq!(emails(&descending), vec![Value::from("Bob@Example.com"), "ada@example.com".into(), "cy@sample.org".into()]);

    let page = select(adapter, by_age(OrderDirection::Asc).limit(2).offset(1)).await?;
    assert_eq!(emails(&page), vec![Value::from("ada@example.com"), "Bob@Example.com".into()]);

    let tail = select(adapter, by_age(OrderDirection::Asc).offset(2)).await?;
    assert_eq!(emails(&tail), vec![Value::from("Bob@Example.com")]);

    let newest = SelectStatement::new(ReadStatement::new(accounts())).column("email").order_by("created_at", OrderDirection::Desc).limit(1);
    assert_eq!(emails(&select(adapter, newest).await?), vec![Value::from("cy@sample.org")]);

    let aliased = SelectStatement::new(ReadStatement::new(projects()).filter(eq("id", 1))).column_as("title", "name");
    assert_eq!(select(adapter, aliased).await?, vec![row! { "name" => "engine" }]);
    Ok(())
}

/// Strings order byte-wise, so upper case sorts before lower case.
pub async fn string_ordering(adapter: &dyn Adapter) -> Result<()> {
    let by_email = |direction| SelectStatement::new(ReadStatement::new(accounts())).column("email").order_by("email", direction);

    let ascending = select(adapter, by_email(OrderDirection::Asc)).await?;
    assert_eq!(emails(&ascending), vec![Value::from("Bob@Example.com"), "ada@example.com".into(), "cy@sample.org".into()]);

    let descending = select(adapter, by_email(OrderDirection::Desc)).await?;
    assert_eq!(emails(&descending), vec![Value::from("cy@sample.org"), "ada@example.com".into(), "Bob@Example.com".into()]);
    Ok(())
}

pub async fn insert_reporting(adapter: &dyn Adapter) -> Result<()> {
    let values = row! { "email" => "eve@example.com", "age" => 52, "active" => false, "created_at" => day(5, 1) };
    let insert = Statement::insert(accounts(), values).returning(Returning::Columns(vec!["email".into()]));
    let result = adapter.execute(ExecuteRequest::new(&insert)).await?;
    assert_eq!(result.insert_id, Some(Value::Integer(4)));
    assert_eq!(result.rows, Some(vec![row! { "email" => "eve@example.com" }]));

    let blank = Statement::insert_many(projects(), vec![Row::new(), Row::new()]);
    let err = adapter.execute(ExecuteRequest::new(&blank)).await.err().ok_or_else(|| anyhow!("columnless batch was accepted"))?;
    assert!(matches!(err, AdapterError::InvalidStatement(_)), "{err}");
    assert_eq!(count(adapter, ReadStatement::new(projects()), None).await?, Some(4));
    Ok(())
}

pub async fn updates_and_deletes(adapter: &dyn Adapter) -> Result<()> {
    let older = Statement::update(accounts(), row! { "age" => 50 }, vec![gt("age", 40)]).returning(Returning::Columns(vec!["id".into()]));
    let result = adapter.execute(ExecuteRequest::new(&older)).await?;
    assert_eq!(result.affected_rows, Some(1));
    assert_eq!(result.rows, Some(vec![row! { "id" => 2 }]));

    let unknown_age = Statement::update(accounts(), row! { "active" => false }, vec![is_null("age")]);
    let result = adapter.execute(ExecuteRequest::new(&unknown_age)).await?;
    assert_eq!((result.affected_rows, result.rows), (Some(1), None));

    let inactive = Statement::delete(accounts(), vec![eq("active", false)]);
    assert_eq!(adapter.execute(ExecuteRequest::new(&inactive)).await?.affected_rows, Some(2));
    assert_eq!(count(adapter, ReadStatement::new(accounts()), None).await?, Some(1));

    let nothing = Statement::delete(accounts(), vec![eq("id", 99)]);
    assert_eq!(adapter.execute(ExecuteRequest::new(&nothing)).await?.affected_rows, Some(0));
    Ok(())
}

pub async fn upserts(adapter: &dyn Adapter) -> Result<()> {
    let changed = row! { "id" => 1, "email" => "ada@new.example.com", "age" => 37, "active" => true, "created_at" => day(1, 1) };
    let result = adapter.execute(ExecuteRequest::new(&Statement::upsert(accounts(), changed))).await?;
    assert_eq!((result.affected_rows, result.insert_id), (Some(1), Some(Value::Integer(1))));

    let reread = select(adapter, SelectStatement::new(ReadStatement::new(accounts()).filter(eq("id", 1))).column("email").column("age")).await?;
    assert_eq!(reread, vec![row! { "email" => "ada@new.example.com", "age" => 37 }]);

    let fresh = row! { "id" => 10, "email" => "eve@example.com", "age" => 22, "active" => false, "created_at" => day(5, 1) };
    let result = adapter.execute(ExecuteRequest::new(&Statement::upsert(accounts(), fresh.clone()))).await?;
    assert_eq!((result.affected_rows, result.insert_id), (Some(1), Some(Value::Integer(10))));
    assert_eq!(count(adapter, ReadStatement::new(accounts()), None).await?, Some(4));

    let Statement::Upsert(mut keep) = Statement::upsert(accounts(), fresh) else { unreachable!() };
    keep.update = Some(Row::new());
    let result = adapter.execute(ExecuteRequest::new(&Statement::Upsert(keep))).await?;
    assert_eq!((result.affected_rows, result.insert_id), (Some(0), None));
    Ok(())
}

pub async fn transactions(adapter: &dyn Adapter) -> Result<()> {
    let all_projects = || ReadStatement::new(projects());

    let abandoned: Result<()> = transaction(adapter, TransactionOptions::default(), |token| async move {
        let wipe = Statement::delete(projects(), vec![]);
        assert_eq!(adapter.execute(ExecuteRequest::in_transaction(&wipe, token)).await?.affected_rows, Some(4));
        assert_eq!(count(adapter, all_projects(), Some(token)).await?, Some(0));
        Err(anyhow!("abandon"))
    })
    .await;
    assert!(abandoned.is_err());
    assert_eq!(count(adapter, all_projects(), None).await?, Some(4));

    transaction(adapter, TransactionOptions::default(), |token| async move {
        let insert = Statement::insert(projects(), row! { "account_id" => 3, "title" => "atlas" });
        adapter.execute(ExecuteRequest::in_transaction(&insert, token)).await?;
        assert_eq!(count(adapter, all_projects(), Some(token)).await?, Some(5));
        Ok::<_, anyhow::Error>(())
    })
    .await?;
    assert_eq!(count(adapter, all_projects(), None).await?, Some(5));

    let token = adapter.begin_transaction(TransactionOptions::default().isolation(IsolationLevel::Serializable)).await?;
    let wipe = Statement::delete(projects(), vec![eq("account_id", 1)]);
    assert_eq!(adapter.execute(ExecuteRequest::in_transaction(&wipe, token)).await?.affected_rows, Some(2));
    adapter.rollback_transaction(token).await?;
    assert_eq!(count(adapter, all_projects(), None).await?, Some(5));

    assert!(matches!(adapter.commit_transaction(token).await, Err(AdapterError::UnknownTransaction(_))));
    let stale = adapter.execute(ExecuteRequest::in_transaction(&wipe, token)).await;
    assert!(matches!(stale, Err(AdapterError::UnknownTransaction(_))));
    Ok(())
}

pub async fn savepoints(adapter: &dyn Adapter) -> Result<()> {
    let insert = |title: &str| Statement::insert(projects(), row! { "account_id" => 3, "title" => title });
    let token = adapter.begin_transaction(TransactionOptions::default()).await?;

    adapter.execute(ExecuteRequest::in_transaction(&insert("kept"), token)).await?;
    adapter.create_savepoint(token, "before_draft").await?;
    adapter.execute(ExecuteRequest::in_transaction(&insert("draft"), token)).await?;
    adapter.rollback_to_savepoint(token, "before_draft").await?;
    adapter.execute(ExecuteRequest::in_transaction(&insert("final"), token)).await?;
    adapter.release_savepoint(token, "before_draft").await?;
    adapter.commit_transaction(token).await?;

    let added = SelectStatement::new(ReadStatement::new(projects()).filter(gt("id", 4))).column("title").order_by("id", OrderDirection::Asc);
    let rows = select(adapter, added).await?;
    assert_eq!(column(&rows, "title"), vec![&Value::from("kept"), &Value::from("final")]);
    Ok(())
}

pub async fn grouping_and_distinct(adapter: &dyn Adapter) -> Result<()> {
    let grouped = SelectStatement::new(ReadStatement::new(projects()).group_by("account_id"))
        .column("account_id")
        .order_by("account_id", OrderDirection::Asc);
    let rows = select(adapter, grouped).await?;
    assert_eq!(column(&rows, "account_id"), vec![&Value::Integer(1), &Value::Integer(2), &Value::Integer(9)]);

    let busy = ReadStatement::new(projects()).group_by("account_id").having(gt("account_id", 1));
    assert_eq!(count(adapter, busy, None).await?, Some(2));

    let distinct = SelectStatement::new(ReadStatement::new(projects())).distinct().column("account_id").order_by("account_id", OrderDirection::Desc);
    let rows = select(adapter, distinct).await?;
    assert_eq!(column(&rows, "account_id"), vec![&Value::Integer(9), &Value::Integer(2), &Value::Integer(1)]);
    Ok(())
}
