use std::cmp::Ordering;

use quarry_ast::{ComparisonOperator, LogicalOperator, NullOperator, Operand, Predicate, Row, Value};
use quarry_core::AdapterError;
use regex::Regex;

use crate::sorting::compare_values;

/// Resolve a column path against a row.
///
/// Exact keys win. A qualified path (`table.column`) falls back to its bare column only when the row carries no
/// qualified keys at all, so single-table statements may qualify columns or not.
pub fn lookup<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    if let Some(value) = row.get(path) {
        return Some(value);
    }
    let (_, column) = path.rsplit_once('.')?;
    if row.keys().any(|key| key.contains('.')) {
        return None;
    }
    row.get(column)
}

fn present<'a>(row: &'a Row, path: &str) -> Option<&'a Value> { lookup(row, path).filter(|value| !value.is_null()) }

/// Translate a SQL `like` pattern into an anchored regex. `%` matches any run, `_` any single character.
pub fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, AdapterError> {
    let mut source = String::from(if case_insensitive { "(?is)^" } else { "(?s)^" });
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source).map_err(|err| AdapterError::invalid(format!("bad like pattern {pattern:?}: {err}")))
}

/// Evaluate a predicate with SQL semantics collapsed to a boolean: any comparison touching null is false.
pub fn evaluate(row: &Row, predicate: &Predicate) -> Result<bool, AdapterError> {
    match predicate {
        Predicate::Comparison { column, operator, operand } => compare(row, column, *operator, operand),
        Predicate::Between { column, lower, upper } => {
            if lower.is_null() || upper.is_null() {
                return Ok(false);
            }
            Ok(present(row, column).is_some_and(|value| {
                compare_values(value, lower) != Ordering::Less && compare_values(value, upper) != Ordering::Greater
            }))
        }
        Predicate::Null { column, operator } => {
            let is_null = present(row, column).is_none();
            Ok(match operator {
                NullOperator::IsNull => is_null,
                NullOperator::IsNotNull => !is_null,
            })
        }
        Predicate::Logical { operator: LogicalOperator::And, predicates } => {
            for predicate in predicates {
                if !evaluate(row, predicate)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Predicate::Logical { operator: LogicalOperator::Or, predicates } => {
            for predicate in predicates {
                if evaluate(row, predicate)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// All predicates must hold.
pub fn evaluate_all(row: &Row, predicates: &[Predicate]) -> Result<bool, AdapterError> {
    for predicate in predicates {
        if !evaluate(row, predicate)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare(row: &Row, column: &str, operator: ComparisonOperator, operand: &Operand) -> Result<bool, AdapterError> {
    use ComparisonOperator::*;

    if let In | NotIn = operator {
        let values = match operand {
            Operand::List(values) => values.as_slice(),
            Operand::Value(value) => std::slice::from_ref(value),
            Operand::Column(_) => return Err(AdapterError::invalid(format!("{column}: in/not in requires a list of values"))),
        };
        if values.is_empty() {
            return Ok(operator == NotIn);
        }
        let Some(value) = present(row, column) else { return Ok(false) };
        let found = values.iter().any(|candidate| !candidate.is_null() && compare_values(value, candidate) == Ordering::Equal);
        return Ok(match operator {
            In => found,
            // `x not in (.., null)` is never true
            _ => !found && !values.iter().any(Value::is_null),
        });
    }

    let right = match operand {
        Operand::List(_) => return Err(AdapterError::invalid(format!("{column}: only in/not in accept a list of values"))),
        Operand::Value(Value::Null) if operator == Eq => return Ok(present(row, column).is_none()),
        Operand::Value(Value::Null) if operator == Ne => return Ok(present(row, column).is_some()),
        Operand::Value(value) => Some(value).filter(|v| !v.is_null()),
        Operand::Column(other) => present(row, other),
    };
    let (Some(left), Some(right)) = (present(row, column), right) else { return Ok(false) };

    Ok(match operator {
        Eq => compare_values(left, right) == Ordering::Equal,
        Ne => compare_values(left, right) != Ordering::Equal,
        Gt => compare_values(left, right) == Ordering::Greater,
        Gte => compare_values(left, right) != Ordering::Less,
        Lt => compare_values(left, right) == Ordering::Less,
        Lte => compare_values(left, right) != Ordering::Greater,
        Like => like_regex(&right.as_text(), false)?.is_match(&left.as_text()),
        ILike => like_regex(&right.as_text(), true)?.is_match(&left.as_text()),
        In | NotIn => unreachable!("handled above"),
    })
}
