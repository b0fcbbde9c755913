use std::cmp::Ordering;

use quarry_ast::{
    DeleteStatement, InsertManyStatement, InsertStatement, Predicate, Returning, Row, Table, UpdateStatement, UpsertStatement, Value,
};
use quarry_core::{AdapterError, AdapterResult};

use crate::filtering::{evaluate_all, lookup};
use crate::sorting::compare_values;
use crate::store::Store;

fn same_value(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (Some(a), Some(b)) => compare_values(a, b) == Ordering::Equal,
        _ => false,
    }
}

fn next_key(rows: &[Row], key: &str) -> i64 { rows.iter().filter_map(|row| row.get(key)?.as_i64()).max().unwrap_or(0) + 1 }

/// Fill in undeclared columns and the auto-increment key, then check the primary key is present and unique.
fn prepare(rows: &[Row], table: &Table, values: &Row) -> Result<Row, AdapterError> {
    let mut row = values.clone();
    for column in table.columns.keys() {
        row.entry(column.clone()).or_insert(Value::Null);
    }
    if let Some(key) = table.auto_increment_key() {
        if row.get(key).map_or(true, Value::is_null) {
            row.insert(key.to_owned(), Value::Integer(next_key(rows, key)));
        }
    }

    if table.primary_key.is_empty() {
        return Ok(row);
    }
    if let Some(missing) = table.primary_key.iter().find(|column| row.get(*column).map_or(true, Value::is_null)) {
        return Err(AdapterError::invalid(format!("{}: primary key column {missing} is required", table.name)));
    }
    let duplicate = rows.iter().any(|existing| table.primary_key.iter().all(|column| same_value(existing.get(column), row.get(column))));
    if duplicate {
        return Err(AdapterError::invalid(format!("{}: duplicate primary key", table.name)));
    }
    Ok(row)
}

/// Evaluated up front so a bad predicate leaves the table untouched.
fn matching(rows: &[Row], filter: &[Predicate]) -> Result<Vec<bool>, AdapterError> {
    rows.iter().map(|row| evaluate_all(row, filter)).collect()
}

fn insert_id(table: &Table, row: &Row) -> Option<Value> { row.get(table.single_primary_key()?).cloned() }

fn returned(returning: &Returning, rows: Vec<Row>) -> Option<Vec<Row>> {
    match returning {
        Returning::None => None,
        Returning::All => Some(rows),
        Returning::Columns(columns) if columns.is_empty() => Some(rows),
        Returning::Columns(columns) => Some(
            rows.iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|column| {
                            let name = column.rsplit('.').next().unwrap_or(column).to_owned();
                            (name, lookup(row, column).cloned().unwrap_or(Value::Null))
                        })
                        .collect()
                })
                .collect(),
        ),
    }
}

fn written(returning: &Returning, rows: Vec<Row>, insert_id: Option<Value>) -> AdapterResult {
    AdapterResult { affected_rows: Some(rows.len() as u64), insert_id, rows: returned(returning, rows) }
}

pub fn insert(store: &mut Store, statement: &InsertStatement) -> Result<AdapterResult, AdapterError> {
    let rows = store.rows_mut(&statement.table.name);
    let row = prepare(rows, &statement.table, &statement.values)?;
    rows.push(row.clone());
    let id = insert_id(&statement.table, &row);
    Ok(written(&statement.returning, vec![row], id))
}

/// All or nothing: a bad row discards the rows inserted before it.
pub fn insert_many(store: &mut Store, statement: &InsertManyStatement) -> Result<AdapterResult, AdapterError> {
    // A single `default values` row is expressible in SQL; several are not.
    if statement.values.len() > 1 && statement.values.iter().all(Row::is_empty) {
        let message = format!("insert of {} rows into {} names no columns", statement.values.len(), statement.table.name);
        return Err(AdapterError::invalid(message));
    }
    let rows = store.rows_mut(&statement.table.name);
    let start = rows.len();
    for values in &statement.values {
        match prepare(rows, &statement.table, values) {
            Ok(row) => rows.push(row),
            Err(err) => {
                rows.truncate(start);
                return Err(err);
            }
        }
    }
    let inserted = rows[start..].to_vec();
    let id = inserted.last().and_then(|row| insert_id(&statement.table, row));
    Ok(written(&statement.returning, inserted, id))
}

pub fn update(store: &mut Store, statement: &UpdateStatement) -> Result<AdapterResult, AdapterError> {
    if statement.changes.is_empty() {
        return Err(AdapterError::invalid(format!("update of {} has no changes", statement.table.name)));
    }
    let rows = store.rows_mut(&statement.table.name);
    let matches = matching(rows, &statement.filter)?;
    let mut updated = Vec::new();
    for (row, _) in rows.iter_mut().zip(&matches).filter(|(_, matched)| **matched) {
        row.extend(statement.changes.iter().map(|(column, value)| (column.clone(), value.clone())));
        updated.push(row.clone());
    }
    Ok(written(&statement.returning, updated, None))
}

pub fn delete(store: &mut Store, statement: &DeleteStatement) -> Result<AdapterResult, AdapterError> {
    let rows = store.rows_mut(&statement.table.name);
    let matches = matching(rows, &statement.filter)?;
    let (removed, kept): (Vec<_>, Vec<_>) = rows.drain(..).zip(matches).partition(|(_, matched)| *matched);
    *rows = kept.into_iter().map(|(row, _)| row).collect();
    Ok(written(&statement.returning, removed.into_iter().map(|(row, _)| row).collect(), None))
}

/// Update the row matching the conflict columns, or insert when none does. An empty update leaves a conflicting row
/// untouched and reports nothing written.
pub fn upsert(store: &mut Store, statement: &UpsertStatement) -> Result<AdapterResult, AdapterError> {
    let table = &statement.table;
    let conflict = statement.conflict_columns();
    if conflict.is_empty() && !statement.update_values().is_empty() {
        return Err(AdapterError::invalid(format!("upsert into {} needs a conflict target to update", table.name)));
    }

    let rows = store.rows_mut(&table.name);
    // Without a conflict target nothing can conflict.
    let existing = match conflict {
        [] => None,
        _ => rows.iter().position(|row| conflict.iter().all(|column| same_value(row.get(column), statement.values.get(column)))),
    };
    let Some(index) = existing else {
        let row = prepare(rows, table, &statement.values)?;
        rows.push(row.clone());
        let id = insert_id(table, &row);
        return Ok(written(&statement.returning, vec![row], id));
    };

    let changes = statement.update_values();
    if changes.is_empty() {
        return Ok(written(&statement.returning, Vec::new(), None));
    }
    let row = &mut rows[index];
    row.extend(changes.iter().map(|(column, value)| (column.clone(), value.clone())));
    let row = row.clone();
    let id = insert_id(table, &row);
    Ok(written(&statement.returning, vec![row], id))
}
