//! PostgreSQL implementation of `Catalog` and `SqlBackend`

use crate::db::{Catalog, ColumnDescriptor, ResultTable, SqlBackend};
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgPool, PgRow, PgValueFormat};
use sqlx::types::BigDecimal;
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Catalog for PgDatabase {
    async fn list_tables(&self, namespace: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1
            "#,
        )
        .bind(namespace)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn list_columns(&self, namespace: &str, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT column_name::text, data_type::text
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
            "#,
        )
        .bind(namespace)
        .bind(table)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type)| ColumnDescriptor { name, data_type })
            .collect())
    }
}

#[async_trait]
impl SqlBackend for PgDatabase {
    async fn explain(&self, sql: &str) -> Result<()> {
        let plan = sqlx::query(&format!("EXPLAIN (FORMAT TEXT) {}", sql))
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;
        debug!("Plan check produced {} plan lines", plan.len());
        Ok(())
    }

    async fn execute(&self, sql: &str) -> Result<Option<ResultTable>> {
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&self.pool)
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut table_rows = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(decode_cell(row, idx));
            }
            table_rows.push(values);
        }

        Ok(Some(ResultTable {
            columns,
            rows: table_rows,
        }))
    }
}

/// Decode one cell into JSON. A cell that cannot be decoded becomes a
/// `<type>` placeholder; the rest of the row is kept.
fn decode_cell(row: &PgRow, idx: usize) -> Value {
    let type_name = row.columns()[idx].type_info().name().to_string();
    match try_decode_cell(row, idx, &type_name) {
        Ok(value) => value,
        Err(e) => {
            warn!("Could not decode column {} ({}): {}", idx, type_name, e);
            placeholder(&type_name)
        }
    }
}

fn try_decode_cell(row: &PgRow, idx: usize, type_name: &str) -> std::result::Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOL" => Value::Bool(row.try_get::<bool, _>(idx)?),
        "INT2" => Value::from(row.try_get::<i16, _>(idx)?),
        "INT4" => Value::from(row.try_get::<i32, _>(idx)?),
        "INT8" => Value::from(row.try_get::<i64, _>(idx)?),
        "FLOAT4" => float_value(row.try_get::<f32, _>(idx)? as f64),
        "FLOAT8" => float_value(row.try_get::<f64, _>(idx)?),
        "NUMERIC" => Value::String(numeric_text(row, idx)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => {
            Value::String(row.try_get::<String, _>(idx)?)
        }
        "DATE" => Value::String(row.try_get::<chrono::NaiveDate, _>(idx)?.to_string()),
        "TIME" => Value::String(row.try_get::<chrono::NaiveTime, _>(idx)?.to_string()),
        "TIMESTAMP" => Value::String(row.try_get::<chrono::NaiveDateTime, _>(idx)?.to_string()),
        "TIMESTAMPTZ" => Value::String(
            row.try_get::<chrono::DateTime<chrono::Utc>, _>(idx)?
                .to_rfc3339(),
        ),
        "INTERVAL" => Value::String(format_interval(&row.try_get::<PgInterval, _>(idx)?)),
        "UUID" => Value::String(row.try_get::<uuid::Uuid, _>(idx)?.to_string()),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx)?,
        "BYTEA" => Value::String(hex_bytes(&row.try_get::<Vec<u8>, _>(idx)?)),
        "BOOL[]" => array_value::<bool, _>(row, idx, Value::Bool)?,
        "INT2[]" => array_value::<i16, _>(row, idx, Value::from)?,
        "INT4[]" => array_value::<i32, _>(row, idx, Value::from)?,
        "INT8[]" => array_value::<i64, _>(row, idx, Value::from)?,
        "FLOAT4[]" => array_value::<f32, _>(row, idx, |f| float_value(f as f64))?,
        "FLOAT8[]" => array_value::<f64, _>(row, idx, float_value)?,
        "NUMERIC[]" => array_value::<BigDecimal, _>(row, idx, |d| Value::String(d.to_plain_string()))?,
        "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => {
            array_value::<String, _>(row, idx, Value::String)?
        }
        "DATE[]" => array_value::<chrono::NaiveDate, _>(row, idx, |d| Value::String(d.to_string()))?,
        "TIMESTAMPTZ[]" => array_value::<chrono::DateTime<chrono::Utc>, _>(row, idx, |t| {
            Value::String(t.to_rfc3339())
        })?,
        "UUID[]" => array_value::<uuid::Uuid, _>(row, idx, |u| Value::String(u.to_string()))?,
        _ => Value::String(row.try_get::<String, _>(idx)?),
    };

    Ok(value)
}

/// Exact text of a NUMERIC cell, including the special values
fn numeric_text(row: &PgRow, idx: usize) -> std::result::Result<String, sqlx::Error> {
    let raw = row.try_get_raw(idx)?;
    if matches!(raw.format(), PgValueFormat::Text) {
        return Ok(raw.as_str().map_err(sqlx::Error::Decode)?.to_string());
    }
    let bytes = raw.as_bytes().map_err(sqlx::Error::Decode)?;
    if let Some(special) = numeric_special(bytes) {
        return Ok(special.to_string());
    }
    let decimal = row.try_get::<BigDecimal, _>(idx)?;
    // Digit groups carry up to three padding zeros; dscale is the declared one
    Ok(match numeric_display_scale(bytes) {
        Some(scale) => decimal.with_scale(scale).to_plain_string(),
        None => decimal.to_plain_string(),
    })
}

/// NaN and the infinities, read from the sign word of the binary header
/// (ndigits, weight, sign, dscale; two bytes each)
fn numeric_special(bytes: &[u8]) -> Option<&'static str> {
    let sign = u16::from_be_bytes([*bytes.get(4)?, *bytes.get(5)?]);
    match sign {
        0xC000 => Some("NaN"),
        0xD000 => Some("Infinity"),
        0xF000 => Some("-Infinity"),
        _ => None,
    }
}

fn numeric_display_scale(bytes: &[u8]) -> Option<i64> {
    Some(u16::from_be_bytes([*bytes.get(6)?, *bytes.get(7)?]) as i64)
}

fn array_value<'r, T, F>(row: &'r PgRow, idx: usize, convert: F) -> std::result::Result<Value, sqlx::Error>
where
    Vec<Option<T>>: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
    F: Fn(T) -> Value,
{
    let items: Vec<Option<T>> = row.try_get(idx)?;
    Ok(Value::Array(
        items
            .into_iter()
            .map(|item| item.map(&convert).unwrap_or(Value::Null))
            .collect(),
    ))
}

/// Interval in the server's default output style, e.g. `1 year 2 mons 3 days 04:05:06.5`
fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    let years = interval.months / 12;
    let months = interval.months % 12;
    if years != 0 {
        parts.push(plural(years as i64, "year"));
    }
    if months != 0 {
        parts.push(plural(months as i64, "mon"));
    }
    if interval.days != 0 {
        parts.push(plural(interval.days as i64, "day"));
    }
    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let total = interval.microseconds.unsigned_abs();
        let secs = total / 1_000_000;
        let frac = total % 1_000_000;
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac != 0 {
            time.push_str(format!(".{:06}", frac).trim_end_matches('0'));
        }
        parts.push(time);
    }
    parts.join(" ")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

fn hex_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn placeholder(type_name: &str) -> Value {
    Value::String(format!("<{}>", type_name.to_lowercase()))
}

fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
