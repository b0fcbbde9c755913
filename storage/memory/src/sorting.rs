use std::cmp::Ordering;

use quarry_ast::{OrderBy, OrderDirection, Row, Value};

use crate::filtering::lookup;

/// Total order over non-null values: timestamps by epoch millisecond, numbers numerically, everything else by
/// its text rendering.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.timestamp_millis().cmp(&b.timestamp_millis()),
        (a, b) if a.is_numeric() && b.is_numeric() => {
            let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            a.total_cmp(&b)
        }
        (a, b) => a.as_text().cmp(&b.as_text()),
    }
}

/// Null and missing values sort before everything else.
fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

/// Stable multi-key sort. Descending keys reverse the whole comparison, nulls included.
pub fn sort_rows(rows: &mut [Row], order_by: &[OrderBy]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for order in order_by {
            let cmp = compare_cells(lookup(a, &order.column), lookup(b, &order.column));
            let cmp = match order.direction {
                OrderDirection::Asc => cmp,
                OrderDirection::Desc => cmp.reverse(),
            };
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}
