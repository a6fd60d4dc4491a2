//! MySQL row extraction and parameter binding

use super::row::Row;
use super::value::SqlValue;
use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlArguments, MySqlColumn, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, MySql, Row as SqlxRow, TypeInfo, ValueRef};

/// MySQL type converter
#[derive(Clone, Default)]
pub struct MySqlTypeConverter;

impl MySqlTypeConverter {
    pub fn new() -> Self {
        MySqlTypeConverter
    }

    /// Convert a driver row into a [`Row`], column by column
    pub fn convert_row(&self, row: &MySqlRow) -> Result<Row> {
        let mut out = Row::with_capacity(row.columns().len());
        for (index, column) in row.columns().iter().enumerate() {
            let value = self.extract_column_value(row, index, column)?;
            out.push(column.name(), value);
        }
        Ok(out)
    }

    /// Extract a TINYINT value (TINYINT(1) may be returned as bool)
    fn extract_tinyint(row: &MySqlRow, index: usize) -> Result<SqlValue> {
        if let Ok(val) = row.try_get::<bool, _>(index) {
            log::trace!("TINYINT at index {} extracted as bool: {}", index, val);
            return Ok(SqlValue::TinyInt(if val { 1 } else { 0 }));
        }

        if let Ok(val) = row.try_get::<i8, _>(index) {
            return Ok(SqlValue::TinyInt(val));
        }

        Err(Error::driver(format!(
            "Failed to extract TINYINT at index {}",
            index
        )))
    }

    fn extract_datetime(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        let type_name = column.type_info().name();
        log::trace!(
            "Extracting datetime from column '{}' with MySQL type '{}'",
            column.name(),
            type_name
        );

        // TIMESTAMP columns
        if let Ok(dt) = row.try_get::<DateTime<Utc>, _>(index) {
            return Ok(SqlValue::DateTime(dt.to_rfc3339()));
        }

        // DATETIME columns
        if let Ok(dt) = row.try_get::<NaiveDateTime, _>(index) {
            let utc_dt = DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
            return Ok(SqlValue::DateTime(utc_dt.to_rfc3339()));
        }

        if let Ok(s) = row.try_get::<String, _>(index) {
            for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(&s, format) {
                    let utc_dt = DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc);
                    return Ok(SqlValue::DateTime(utc_dt.to_rfc3339()));
                }
            }
            return Ok(SqlValue::DateTime(s));
        }

        Err(Error::driver(format!(
            "Failed to extract datetime from column '{}' (MySQL type: '{}')",
            column.name(),
            type_name
        )))
    }

    fn extract_date(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(date) = row.try_get::<NaiveDate, _>(index) {
            return Ok(SqlValue::Date(date.to_string()));
        }

        if let Ok(s) = row.try_get::<String, _>(index) {
            return Ok(SqlValue::Date(s));
        }

        Err(Error::driver(format!(
            "Failed to extract date from column '{}'",
            column.name()
        )))
    }

    fn extract_time(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        if let Ok(time) = row.try_get::<NaiveTime, _>(index) {
            return Ok(SqlValue::Time(time.to_string()));
        }

        if let Ok(s) = row.try_get::<String, _>(index) {
            return Ok(SqlValue::Time(s));
        }

        Err(Error::driver(format!(
            "Failed to extract time from column '{}'",
            column.name()
        )))
    }

    fn extract_decimal(row: &MySqlRow, index: usize, column: &MySqlColumn) -> Result<SqlValue> {
        #[cfg(feature = "decimal")]
        {
            if let Ok(d) = row.try_get::<rust_decimal::Decimal, _>(index) {
                return Ok(SqlValue::Decimal(d));
            }
        }

        // DECIMAL is usually sent as text to preserve precision
        if let Ok(s) = row.try_get::<String, _>(index) {
            #[cfg(feature = "decimal")]
            {
                if let Ok(d) = s.parse::<rust_decimal::Decimal>() {
                    return Ok(SqlValue::Decimal(d));
                }
            }
            #[cfg(not(feature = "decimal"))]
            return Ok(SqlValue::Decimal(s));
        }

        if let Ok(f) = row.try_get::<f64, _>(index) {
            return Ok(SqlValue::Double(f));
        }

        Err(Error::driver(format!(
            "Failed to extract decimal from column '{}'",
            column.name()
        )))
    }

    fn extract_unsigned(row: &MySqlRow, index: usize, type_name: &str) -> Result<SqlValue> {
        let value = if type_name.contains("TINYINT") {
            row.try_get::<u8, _>(index).map(SqlValue::UnsignedTinyInt)
        } else if type_name.contains("SMALLINT") {
            row.try_get::<u16, _>(index).map(SqlValue::UnsignedSmallInt)
        } else if type_name.contains("BIGINT") {
            row.try_get::<u64, _>(index).map(SqlValue::UnsignedBigInt)
        } else {
            row.try_get::<u32, _>(index).map(SqlValue::UnsignedInt)
        };

        value.map_err(|e| Error::driver(format!("Failed to extract {}: {}", type_name, e)))
    }

    /// Extract one column value, dispatching on the MySQL type name
    pub fn extract_column_value(
        &self,
        row: &MySqlRow,
        index: usize,
        column: &MySqlColumn,
    ) -> Result<SqlValue> {
        let raw = row.try_get_raw(index).map_err(|e| {
            Error::driver(format!("Failed to get raw value at column {}: {}", index, e))
        })?;
        if raw.is_null() {
            return Ok(SqlValue::Null);
        }

        let type_name = column.type_info().name();
        let failed = |what: &str, e: sqlx::Error| {
            Error::driver(format!(
                "Failed to extract {} from column '{}': {}",
                what,
                column.name(),
                e
            ))
        };

        match type_name {
            "BOOLEAN" | "BOOL" | "TINYINT" => Self::extract_tinyint(row, index),
            "SMALLINT" => row
                .try_get::<i16, _>(index)
                .map(SqlValue::SmallInt)
                .map_err(|e| failed("smallint", e)),
            "MEDIUMINT" | "INT" | "INTEGER" => row
                .try_get::<i32, _>(index)
                .map(SqlValue::Int)
                .map_err(|e| failed("int", e)),
            "BIGINT" => row
                .try_get::<i64, _>(index)
                .map(SqlValue::BigInt)
                .map_err(|e| failed("bigint", e)),
            "FLOAT" => row
                .try_get::<f32, _>(index)
                .map(SqlValue::Float)
                .map_err(|e| failed("float", e)),
            "DOUBLE" | "REAL" => row
                .try_get::<f64, _>(index)
                .map(SqlValue::Double)
                .map_err(|e| failed("double", e)),
            "VARCHAR" | "CHAR" | "TINYTEXT" => row
                .try_get::<String, _>(index)
                .map(SqlValue::String)
                .map_err(|e| failed("string", e)),
            "TEXT" | "MEDIUMTEXT" | "LONGTEXT" => row
                .try_get::<String, _>(index)
                .map(SqlValue::Text)
                .map_err(|e| failed("text", e)),
            "JSON" => row
                .try_get::<JsonValue, _>(index)
                .map(SqlValue::Json)
                .map_err(|e| failed("JSON", e)),
            "DATE" => Self::extract_date(row, index, column),
            "TIME" => Self::extract_time(row, index, column),
            "DATETIME" | "TIMESTAMP" => Self::extract_datetime(row, index, column),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
                .try_get::<Vec<u8>, _>(index)
                .map(SqlValue::Bytes)
                .map_err(|e| failed("binary data", e)),
            "DECIMAL" | "NUMERIC" => Self::extract_decimal(row, index, column),
            "YEAR" => row
                .try_get::<u16, _>(index)
                .map(SqlValue::UnsignedSmallInt)
                .map_err(|e| failed("year", e)),
            "ENUM" | "SET" => row
                .try_get::<String, _>(index)
                .map(SqlValue::Enum)
                .map_err(|e| failed("enum", e)),
            "BIT" => {
                if let Ok(val) = row.try_get::<u64, _>(index) {
                    return Ok(SqlValue::UnsignedBigInt(val));
                }
                let bytes = row
                    .try_get::<Vec<u8>, _>(index)
                    .map_err(|e| failed("bit", e))?;
                // BIT(n) arrives big-endian
                let val = bytes
                    .iter()
                    .take(8)
                    .fold(0u64, |acc, &byte| (acc << 8) | byte as u64);
                Ok(SqlValue::UnsignedBigInt(val))
            }
            _ if type_name.contains("UNSIGNED") => Self::extract_unsigned(row, index, type_name),
            _ => {
                if let Ok(s) = row.try_get::<String, _>(index) {
                    Ok(SqlValue::String(s))
                } else {
                    log::warn!(
                        "Unknown MySQL type '{}' for column '{}'",
                        type_name,
                        column.name()
                    );
                    Ok(SqlValue::Null)
                }
            }
        }
    }

    /// Bind a SqlValue to a MySQL query
    pub fn bind_param<'q>(
        query: Query<'q, MySql, MySqlArguments>,
        value: SqlValue,
    ) -> Query<'q, MySql, MySqlArguments> {
        match value {
            SqlValue::Null => query.bind(None::<Vec<u8>>), // MySQL accepts NULL for any type
            SqlValue::Bool(b) => query.bind(b),

            SqlValue::TinyInt(i) => query.bind(i),
            SqlValue::SmallInt(i) => query.bind(i),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::BigInt(i) => query.bind(i),

            SqlValue::UnsignedTinyInt(i) => query.bind(i),
            SqlValue::UnsignedSmallInt(i) => query.bind(i),
            SqlValue::UnsignedInt(i) => query.bind(i),
            SqlValue::UnsignedBigInt(i) => query.bind(i),

            SqlValue::Float(f) => query.bind(f),
            SqlValue::Double(f) => query.bind(f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => query.bind(d),
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => query.bind(s),

            SqlValue::String(s) | SqlValue::Text(s) => query.bind(s),
            SqlValue::Bytes(b) => query.bind(b),

            SqlValue::Enum(s) => query.bind(s),
            SqlValue::Uuid(s) => query.bind(s), // stored as CHAR(36)
            SqlValue::Json(j) => query.bind(j),
            SqlValue::Date(s) => match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
                Ok(date) => query.bind(date),
                Err(_) => query.bind(s),
            },
            SqlValue::Time(s) => {
                if let Ok(time) = NaiveTime::parse_from_str(&s, "%H:%M:%S%.f") {
                    query.bind(time)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::DateTime(s) => {
                // MySQL DATETIME has no zone
                if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
                    query.bind(dt.naive_utc())
                } else if let Ok(ndt) = NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
                    query.bind(ndt)
                } else {
                    query.bind(s)
                }
            }
            SqlValue::Timestamp(ts) => match DateTime::from_timestamp(ts, 0) {
                Some(dt) => query.bind(dt.naive_utc()),
                None => query.bind(ts),
            },
            // The compiler expands lists into one placeholder per element
            SqlValue::List(values) => {
                query.bind(JsonValue::Array(values.iter().map(|v| v.to_json()).collect()))
            }
        }
    }
}
