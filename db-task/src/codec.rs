//! 行数据编解码
//!
//! `Value` 与 PostgreSQL 类型之间的转换：读取时按列类型解码，写入时按标签绑定参数。

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use common::errors::{AppError, AppResult};
use common::models::{Row, Value};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo};
use uuid::Uuid;

pub(crate) type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Decodes every column of a result row.
pub(crate) fn decode_row(row: &PgRow) -> AppResult<Row> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let value = decode_cell(row, column.ordinal(), column.type_info().name())
            .map_err(|e| AppError::Query(format!("column `{}`: {e}", column.name())))?;
        decoded.insert(column.name(), value);
    }
    Ok(decoded)
}

fn decode_cell(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, String> {
    let value = match type_name {
        "BOOL" => get::<bool>(row, idx, Value::Bool),
        "INT2" => get::<i16>(row, idx, Value::from),
        "INT4" => get::<i32>(row, idx, Value::from),
        "INT8" => get::<i64>(row, idx, Value::Int),
        "FLOAT4" => get::<f32>(row, idx, Value::from),
        "FLOAT8" => get::<f64>(row, idx, Value::Float),
        "NUMERIC" => get::<Decimal>(row, idx, Value::Decimal),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "UNKNOWN" => get::<String>(row, idx, Value::Text),
        "BYTEA" => get::<Vec<u8>>(row, idx, Value::Bytes),
        "DATE" => get::<NaiveDate>(row, idx, Value::Date),
        "TIMESTAMP" => get::<NaiveDateTime>(row, idx, Value::Timestamp),
        "TIMESTAMPTZ" => get::<DateTime<Utc>>(row, idx, Value::TimestampTz),
        "UUID" => get::<Uuid>(row, idx, Value::Uuid),
        "JSON" | "JSONB" => get::<serde_json::Value>(row, idx, Value::Json),
        other => {
            return Err(format!(
                "unsupported type {other}; cast it to text in the query"
            ))
        }
    };
    value.map_err(|e| e.to_string())
}

fn get<'r, T>(row: &'r PgRow, idx: usize, wrap: impl FnOnce(T) -> Value) -> Result<Value, sqlx::Error>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    Ok(row.try_get::<Option<T>, _>(idx)?.map_or(Value::Null, wrap))
}

/// Binds one value as the next positional parameter.
///
/// NULL is bound as untyped text; the generated SQL casts every placeholder
/// to its column type.
pub(crate) fn bind_value<'q>(query: PgQuery<'q>, value: &'q Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Decimal(d) => query.bind(*d),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Bytes(b) => query.bind(b.as_slice()),
        Value::Date(d) => query.bind(*d),
        Value::Timestamp(t) => query.bind(*t),
        Value::TimestampTz(t) => query.bind(*t),
        Value::Uuid(u) => query.bind(*u),
        Value::Json(j) => query.bind(j.clone()),
    }
}

/// Checks if a value's tag can be stored in a column of `pg_type`.
///
/// `pg_type` is the unmodified name reported by `format_type`, for example
/// `integer` or `timestamp with time zone`. Text is accepted everywhere since
/// the server parses it; unknown types (arrays, enums, domains) are left for
/// the server to judge.
pub(crate) fn value_fits(value: &Value, pg_type: &str) -> bool {
    if matches!(value, Value::Null | Value::Text(_)) {
        return true;
    }
    match pg_type {
        "smallint" | "integer" | "bigint" => matches!(value, Value::Int(_)),
        "numeric" | "real" | "double precision" => {
            matches!(value, Value::Int(_) | Value::Float(_) | Value::Decimal(_))
        }
        "boolean" => matches!(value, Value::Bool(_)),
        "text" | "character varying" | "bpchar" | "character" | "name" | "citext" => {
            !matches!(value, Value::Bytes(_) | Value::Json(_))
        }
        "bytea" => matches!(value, Value::Bytes(_)),
        "date" => matches!(value, Value::Date(_)),
        "timestamp without time zone" => matches!(value, Value::Timestamp(_) | Value::Date(_)),
        "timestamp with time zone" => matches!(
            value,
            Value::TimestampTz(_) | Value::Timestamp(_) | Value::Date(_)
        ),
        "uuid" => matches!(value, Value::Uuid(_)),
        "json" | "jsonb" => matches!(value, Value::Json(_)),
        _ => true,
    }
}
