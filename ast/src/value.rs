use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value as seen by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
}

/// A row keyed by column name. A key that is absent is "undefined", which is distinct from `Value::Null`.
pub type Row = IndexMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn is_numeric(&self) -> bool { matches!(self, Value::Integer(_) | Value::Float(_)) }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(int) => Some(*int),
            Value::Float(float) if float.fract() == 0.0 => Some(*float as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(int) => Some(*int as f64),
            Value::Float(float) => Some(*float),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Textual rendering used for string comparisons and pattern matching.
    pub fn as_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(int) => int.to_string(),
            Value::Float(float) => float.to_string(),
            Value::String(s) => s.clone(),
            Value::Timestamp(ts) => ts.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self { Value::Bool(value) }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self { Value::Integer(value as i64) }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self { Value::Integer(value) }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self { Value::Integer(value as i64) }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self { Value::Float(value) }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self { Value::String(value.to_owned()) }
}

impl From<String> for Value {
    fn from(value: String) -> Self { Value::String(value) }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self { Value::Timestamp(value) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Build a [`Row`] from `"column" => value` pairs.
///
/// ```
/// let row = quarry_ast::row! { "id" => 1, "email" => "a@example.com" };
/// assert_eq!(row.len(), 2);
/// ```
#[macro_export]
macro_rules! row {
    () => { $crate::Row::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut row = $crate::Row::new();
        $( row.insert(::std::string::String::from($column), $crate::Value::from($value)); )+
        row
    }};
}
