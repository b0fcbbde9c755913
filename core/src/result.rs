use quarry_ast::{Row, Value};

/// Column name under which `count` and `exists` statements report their total.
pub const COUNT_COLUMN: &str = "count";

/// Normalized outcome of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterResult {
    /// Present for reads and for writes that requested `returning`.
    pub rows: Option<Vec<Row>>,
    /// Present for writes.
    pub affected_rows: Option<u64>,
    /// The primary key assigned by the last insert, for tables keyed by a single column.
    pub insert_id: Option<Value>,
}

impl AdapterResult {
    pub fn with_rows(rows: Vec<Row>) -> Self { Self { rows: Some(rows), ..Default::default() } }

    pub fn affected(affected_rows: u64) -> Self { Self { affected_rows: Some(affected_rows), ..Default::default() } }

    pub fn rows(&self) -> &[Row] { self.rows.as_deref().unwrap_or_default() }

    pub fn into_rows(self) -> Vec<Row> { self.rows.unwrap_or_default() }

    /// The total reported by a `count` statement.
    pub fn count(&self) -> Option<i64> { self.rows().first()?.get(COUNT_COLUMN)?.as_i64() }

    /// Whether an `exists` statement matched anything.
    pub fn exists(&self) -> Option<bool> { self.count().map(|count| count > 0) }
}
