//! SQLite value type conversions

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use quarry_ast::Value;
use rusqlite::types::{Value as SqliteValue, ValueRef};

/// Convert to a rusqlite parameter. Booleans bind as 0/1 and timestamps as RFC 3339 text with millisecond
/// precision, so they sort correctly as text.
pub fn to_sqlite(value: &Value) -> SqliteValue {
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(*b as i64),
        Value::Integer(int) => SqliteValue::Integer(*int),
        Value::Float(float) => SqliteValue::Real(*float),
        Value::String(s) => SqliteValue::Text(s.clone()),
        Value::Timestamp(ts) => SqliteValue::Text(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
    }
}

/// How a result column should be decoded, from its declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Boolean,
    Timestamp,
    Other,
}

impl ColumnKind {
    pub fn from_decl_type(decl_type: Option<&str>) -> Self {
        match decl_type.map(str::to_ascii_lowercase).as_deref() {
            Some("boolean" | "bool") => ColumnKind::Boolean,
            Some("timestamp" | "datetime" | "timestamptz") => ColumnKind::Timestamp,
            _ => ColumnKind::Other,
        }
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").ok().map(|naive| naive.and_utc()))
}

pub fn from_sqlite(value: ValueRef<'_>, kind: ColumnKind) -> Value {
    match (value, kind) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(int), ColumnKind::Boolean) => Value::Bool(int != 0),
        (ValueRef::Integer(int), _) => Value::Integer(int),
        (ValueRef::Real(float), _) => Value::Float(float),
        (ValueRef::Text(bytes), kind) => {
            let text = String::from_utf8_lossy(bytes);
            match kind {
                ColumnKind::Timestamp => parse_timestamp(&text).map(Value::Timestamp).unwrap_or_else(|| Value::String(text.into_owned())),
                _ => Value::String(text.into_owned()),
            }
        }
        (ValueRef::Blob(bytes), _) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}
