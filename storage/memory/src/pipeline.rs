use std::collections::HashSet;

use quarry_ast::{JoinKind, Predicate, Projection, ReadStatement, Row, SelectStatement, Table, Value};
use quarry_core::{AdapterError, COUNT_COLUMN};
use serde::Serialize;
use tracing::debug;

use crate::filtering::{evaluate, evaluate_all, lookup};
use crate::sorting::sort_rows;
use crate::store::Store;

/// Expose every column both bare and as `table.column`.
fn qualify(table: &str, row: &Row) -> Row {
    let mut qualified = Row::with_capacity(row.len() * 2);
    for (column, value) in row {
        qualified.insert(column.clone(), value.clone());
    }
    for (column, value) in row {
        qualified.insert(format!("{table}.{column}"), value.clone());
    }
    qualified
}

/// A row of nulls standing in for a missing join partner: every declared column plus any column seen in stored rows.
fn null_partner(store: &Store, table: &Table) -> Row {
    let mut nulls = Row::new();
    for column in table.columns.keys() {
        nulls.insert(column.clone(), Value::Null);
    }
    for row in store.rows(&table.name) {
        for column in row.keys() {
            nulls.entry(column.clone()).or_insert(Value::Null);
        }
    }
    qualify(&table.name, &nulls)
}

/// Later keys overwrite earlier ones, the way a driver decodes duplicate result columns.
fn merge(left: &Row, right: &Row) -> Row {
    let mut merged = left.clone();
    for (key, value) in right {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

fn join_rows(store: &Store, read: &ReadStatement) -> Result<Vec<Row>, AdapterError> {
    let mut rows: Vec<Row> = store.rows(&read.table.name).iter().map(|row| qualify(&read.table.name, row)).collect();
    let mut joined_tables = vec![&read.table];

    for join in &read.joins {
        let partners: Vec<Row> = store.rows(&join.table.name).iter().map(|row| qualify(&join.table.name, row)).collect();
        let mut partner_matched = vec![false; partners.len()];
        let mut output = Vec::new();

        for left in &rows {
            let mut matched = false;
            for (index, right) in partners.iter().enumerate() {
                let candidate = merge(left, right);
                if evaluate(&candidate, &join.on)? {
                    matched = true;
                    partner_matched[index] = true;
                    output.push(candidate);
                }
            }
            if !matched && matches!(join.kind, JoinKind::Left | JoinKind::Full) {
                output.push(merge(left, &null_partner(store, &join.table)));
            }
        }

        if matches!(join.kind, JoinKind::Right | JoinKind::Full) {
            let left_nulls = joined_tables.iter().fold(Row::new(), |acc, table| merge(&acc, &null_partner(store, table)));
            for (right, _) in partners.iter().zip(&partner_matched).filter(|(_, matched)| !**matched) {
                output.push(merge(&left_nulls, right));
            }
        }

        joined_tables.push(&join.table);
        rows = output;
    }
    Ok(rows)
}

fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, AdapterError> {
    serde_json::to_string(value).map_err(|err| AdapterError::invalid(format!("unserializable row: {err}")))
}

/// Keep the first row of each distinct grouping key. No aggregation happens.
fn group_rows(rows: Vec<Row>, group_by: &[String]) -> Result<Vec<Row>, AdapterError> {
    if group_by.is_empty() {
        return Ok(rows);
    }
    let mut seen = HashSet::new();
    let mut grouped = Vec::new();
    for row in rows {
        let key: Vec<Option<&Value>> = group_by.iter().map(|column| lookup(&row, column)).collect();
        if seen.insert(fingerprint(&key)?) {
            grouped.push(row);
        }
    }
    Ok(grouped)
}

fn retain(rows: Vec<Row>, predicates: &[Predicate]) -> Result<Vec<Row>, AdapterError> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        if evaluate_all(&row, predicates)? {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// join, where, group by, having.
pub fn read_rows(store: &Store, read: &ReadStatement) -> Result<Vec<Row>, AdapterError> {
    let rows = join_rows(store, read)?;
    let rows = retain(rows, &read.filter)?;
    let rows = group_rows(rows, &read.group_by)?;
    retain(rows, &read.having)
}

fn unqualified(row: &Row) -> impl Iterator<Item = (&String, &Value)> { row.iter().filter(|(key, _)| !key.contains('.')) }

/// An empty column list selects everything, as `*` does.
pub fn project(row: &Row, projection: &Projection) -> Row {
    match projection {
        Projection::Columns(columns) if !columns.is_empty() => {
            let mut projected = Row::with_capacity(columns.len());
            for column in columns {
                if column.column == "*" {
                    projected.extend(unqualified(row).map(|(key, value)| (key.clone(), value.clone())));
                    continue;
                }
                let name = column.alias.clone().unwrap_or_else(|| column.column.rsplit('.').next().unwrap_or(&column.column).to_owned());
                projected.insert(name, lookup(row, &column.column).cloned().unwrap_or(Value::Null));
            }
            projected
        }
        Projection::All | Projection::Columns(_) => unqualified(row).map(|(key, value)| (key.clone(), value.clone())).collect(),
    }
}

/// order by, projection, distinct, offset, limit.
pub fn select(store: &Store, select: &SelectStatement) -> Result<Vec<Row>, AdapterError> {
    let mut rows = read_rows(store, &select.read)?;
    sort_rows(&mut rows, &select.order_by);
    let mut rows: Vec<Row> = rows.iter().map(|row| project(row, &select.projection)).collect();

    // Dedup the projected rows, before paging, as SQL does.
    if select.distinct {
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(rows.len());
        for row in rows {
            if seen.insert(fingerprint(&row)?) {
                unique.push(row);
            }
        }
        rows = unique;
    }

    let offset = select.offset.map_or(0, |offset| offset as usize);
    let limit = select.limit.map_or(usize::MAX, |limit| limit as usize);
    let rows: Vec<Row> = rows.into_iter().skip(offset).take(limit).collect();
    debug!("memory select on {} yielded {} rows", select.read.table.name, rows.len());
    Ok(rows)
}

/// `count` and `exists` both report the number of matching rows under [`COUNT_COLUMN`].
pub fn count(store: &Store, read: &ReadStatement) -> Result<Vec<Row>, AdapterError> {
    let count = read_rows(store, read)?.len() as i64;
    let mut row = Row::new();
    row.insert(COUNT_COLUMN.to_owned(), Value::Integer(count));
    Ok(vec![row])
}
