//! Conversions between [`Value`] and the Postgres wire types.

use bytes::BytesMut;
use chrono::NaiveDateTime;
use quarry_ast::{Row, Value};
use quarry_core::AdapterError;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// Binds a [`Value`] as whatever type Postgres inferred for the parameter.
///
/// Integers narrow to `int2`/`int4` (failing on overflow), widen to floats, and render as text for text
/// parameters. Nulls are accepted for every type.
#[derive(Debug)]
pub struct PgParam<'a>(pub &'a Value);

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Integer(int) => match *ty {
                Type::INT2 => i16::try_from(*int)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*int)?.to_sql(ty, out),
                Type::FLOAT4 => (*int as f32).to_sql(ty, out),
                Type::FLOAT8 => (*int as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR | Type::BPCHAR => int.to_string().to_sql(ty, out),
                _ => int.to_sql(ty, out),
            },
            Value::Float(float) => match *ty {
                Type::FLOAT4 => (*float as f32).to_sql(ty, out),
                _ => float.to_sql(ty, out),
            },
            Value::String(s) => s.as_str().to_sql(ty, out),
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMP => ts.naive_utc().to_sql(ty, out),
                _ => ts.to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true // conversion is decided per value in to_sql
    }

    to_sql_checked!();
}

pub fn params(values: &[Value]) -> Vec<PgParam<'_>> { values.iter().map(PgParam).collect() }

fn get<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a tokio_postgres::Row, index: usize) -> Result<Option<T>, AdapterError> {
    row.try_get::<_, Option<T>>(index).map_err(AdapterError::driver)
}

/// Decode a result row by column type. Types without a [`Value`] counterpart are read as text.
pub fn decode_row(row: &tokio_postgres::Row) -> Result<Row, AdapterError> {
    let mut decoded = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = match *column.type_() {
            Type::BOOL => get::<bool>(row, index)?.map(Value::Bool),
            Type::INT2 => get::<i16>(row, index)?.map(|v| Value::Integer(v.into())),
            Type::INT4 => get::<i32>(row, index)?.map(|v| Value::Integer(v.into())),
            Type::INT8 => get::<i64>(row, index)?.map(Value::Integer),
            Type::FLOAT4 => get::<f32>(row, index)?.map(|v| Value::Float(v.into())),
            Type::FLOAT8 => get::<f64>(row, index)?.map(Value::Float),
            Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, index)?.map(Value::Timestamp),
            Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?.map(|naive| Value::Timestamp(naive.and_utc())),
            _ => get::<String>(row, index)?.map(Value::String),
        };
        decoded.insert(column.name().to_owned(), value.unwrap_or(Value::Null));
    }
    Ok(decoded)
}
