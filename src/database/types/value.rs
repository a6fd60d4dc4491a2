//! Unified SQL value type for all database operations
//!
//! This module provides the single source of truth for SQL values
//! across the driver layer, the compiler and the result mapper.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Generic SQL value type for parameter binding and result extraction
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    // Null
    Null,

    // Boolean
    Bool(bool),

    // Integer variants (for precise type mapping)
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),

    // Unsigned integers (important for MySQL)
    UnsignedTinyInt(u8),
    UnsignedSmallInt(u16),
    UnsignedInt(u32),
    UnsignedBigInt(u64),

    // Floating point
    Float(f32),
    Double(f64),
    #[cfg(feature = "decimal")]
    Decimal(rust_decimal::Decimal),
    #[cfg(not(feature = "decimal"))]
    Decimal(String), // Fallback to string when decimal feature is disabled

    // Text types
    String(String), // VARCHAR/CHAR
    Text(String),   // TEXT/CLOB

    // Binary
    Bytes(Vec<u8>),

    // Semantic types
    Enum(String),     // ENUM/SET value
    Uuid(String),     // UUID as string
    Json(JsonValue),  // JSON data
    Date(String),     // ISO date: "2024-01-15"
    Time(String),     // ISO time: "14:30:00"
    DateTime(String), // ISO datetime: "2024-01-15T10:30:00+00:00"
    Timestamp(i64),   // Unix timestamp (seconds since epoch)

    // Value list, only valid as the right-hand side of IN / NOT IN
    List(Vec<SqlValue>),
}

/// Declared kind of a value, used to dispatch rendering and binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    Decimal,
    Text,
    Bytes,
    Json,
    Temporal,
    List,
}

impl SqlValue {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Declared kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            SqlValue::Null => ValueKind::Null,
            SqlValue::Bool(_) => ValueKind::Bool,
            SqlValue::TinyInt(_)
            | SqlValue::SmallInt(_)
            | SqlValue::Int(_)
            | SqlValue::BigInt(_)
            | SqlValue::UnsignedTinyInt(_)
            | SqlValue::UnsignedSmallInt(_)
            | SqlValue::UnsignedInt(_)
            | SqlValue::UnsignedBigInt(_)
            | SqlValue::Timestamp(_) => ValueKind::Integer,
            SqlValue::Float(_) | SqlValue::Double(_) => ValueKind::Float,
            SqlValue::Decimal(_) => ValueKind::Decimal,
            SqlValue::String(_) | SqlValue::Text(_) | SqlValue::Enum(_) | SqlValue::Uuid(_) => {
                ValueKind::Text
            }
            SqlValue::Bytes(_) => ValueKind::Bytes,
            SqlValue::Json(_) => ValueKind::Json,
            SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::DateTime(_) => ValueKind::Temporal,
            SqlValue::List(_) => ValueKind::List,
        }
    }

    /// True for NULL, empty text and empty lists
    pub fn is_empty(&self) -> bool {
        match self {
            SqlValue::Null => true,
            SqlValue::String(s) | SqlValue::Text(s) | SqlValue::Enum(s) => s.is_empty(),
            SqlValue::List(values) => values.is_empty(),
            _ => false,
        }
    }

    /// Convert to a boolean if possible
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SqlValue::Bool(b) => Some(*b),
            SqlValue::String(s) | SqlValue::Text(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "yes" | "y" | "1" => Some(true),
                "false" | "f" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            other => other.as_i64().map(|i| i != 0),
        }
    }

    /// Convert to an i64 if possible
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Bool(b) => Some(*b as i64),
            SqlValue::TinyInt(i) => Some(*i as i64),
            SqlValue::SmallInt(i) => Some(*i as i64),
            SqlValue::Int(i) => Some(*i as i64),
            SqlValue::BigInt(i) => Some(*i),
            SqlValue::UnsignedTinyInt(i) => Some(*i as i64),
            SqlValue::UnsignedSmallInt(i) => Some(*i as i64),
            SqlValue::UnsignedInt(i) => Some(*i as i64),
            SqlValue::UnsignedBigInt(i) => i64::try_from(*i).ok(),
            SqlValue::Timestamp(ts) => Some(*ts),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => {
                use rust_decimal::prelude::ToPrimitive;
                if d.fract().is_zero() {
                    d.to_i64()
                } else {
                    None
                }
            }
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => s.parse().ok(),
            SqlValue::String(s) | SqlValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Convert to an f64 if possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f as f64),
            SqlValue::Double(f) => Some(*f),
            #[cfg(feature = "decimal")]
            SqlValue::Decimal(d) => {
                use rust_decimal::prelude::ToPrimitive;
                d.to_f64()
            }
            #[cfg(not(feature = "decimal"))]
            SqlValue::Decimal(s) => s.parse().ok(),
            SqlValue::String(s) | SqlValue::Text(s) => s.trim().parse().ok(),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Convert to a String
    pub fn as_string(&self) -> Option<String> {
        match self {
            SqlValue::Null | SqlValue::Bytes(_) | SqlValue::List(_) => None,
            SqlValue::String(s) | SqlValue::Text(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            SqlValue::Null => JsonValue::Null,
            SqlValue::Bool(b) => JsonValue::Bool(*b),
            SqlValue::TinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::SmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Int(i) => JsonValue::Number((*i).into()),
            SqlValue::BigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedTinyInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedSmallInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedInt(i) => JsonValue::Number((*i).into()),
            SqlValue::UnsignedBigInt(i) => JsonValue::Number((*i).into()),
            SqlValue::Float(f) => serde_json::Number::from_f64(*f as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            SqlValue::Decimal(d) => JsonValue::String(d.to_string()),
            SqlValue::String(s) | SqlValue::Text(s) => JsonValue::String(s.clone()),
            SqlValue::Enum(s) | SqlValue::Uuid(s) => JsonValue::String(s.clone()),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => {
                JsonValue::String(s.clone())
            }
            SqlValue::Json(j) => j.clone(),
            SqlValue::Timestamp(ts) => JsonValue::Number((*ts).into()),
            SqlValue::Bytes(bytes) => JsonValue::String(base64_encode(bytes)),
            SqlValue::List(values) => {
                JsonValue::Array(values.iter().map(|v| v.to_json()).collect())
            }
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(b) => write!(f, "{}", b),
            SqlValue::TinyInt(i) => write!(f, "{}", i),
            SqlValue::SmallInt(i) => write!(f, "{}", i),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::BigInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedTinyInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedSmallInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedInt(i) => write!(f, "{}", i),
            SqlValue::UnsignedBigInt(i) => write!(f, "{}", i),
            SqlValue::Float(fl) => write!(f, "{}", fl),
            SqlValue::Double(d) => write!(f, "{}", d),
            SqlValue::Decimal(d) => write!(f, "{}", d),
            SqlValue::String(s) | SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Enum(s) | SqlValue::Uuid(s) => write!(f, "{}", s),
            SqlValue::Date(s) | SqlValue::Time(s) | SqlValue::DateTime(s) => write!(f, "{}", s),
            SqlValue::Json(j) => write!(f, "{}", j),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts),
            SqlValue::Bytes(b) => write!(f, "<binary:{} bytes>", b.len()),
            SqlValue::List(values) => {
                write!(f, "[")?;
                for (i, val) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
        }
    }
}

fn base64_encode(data: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(data)
}

// From trait implementations for common types
impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i8> for SqlValue {
    fn from(v: i8) -> Self {
        SqlValue::TinyInt(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::SmallInt(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::BigInt(v)
    }
}

impl From<u8> for SqlValue {
    fn from(v: u8) -> Self {
        SqlValue::UnsignedTinyInt(v)
    }
}

impl From<u16> for SqlValue {
    fn from(v: u16) -> Self {
        SqlValue::UnsignedSmallInt(v)
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::UnsignedInt(v)
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::UnsignedBigInt(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        SqlValue::Float(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Double(v)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::String(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::String(s.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(s: &String) -> Self {
        SqlValue::String(s.clone())
    }
}

impl From<&i32> for SqlValue {
    fn from(i: &i32) -> Self {
        SqlValue::Int(*i)
    }
}

impl From<&i64> for SqlValue {
    fn from(i: &i64) -> Self {
        SqlValue::BigInt(*i)
    }
}

impl From<&bool> for SqlValue {
    fn from(b: &bool) -> Self {
        SqlValue::Bool(*b)
    }
}

impl From<&f64> for SqlValue {
    fn from(f: &f64) -> Self {
        SqlValue::Double(*f)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl From<JsonValue> for SqlValue {
    fn from(v: JsonValue) -> Self {
        SqlValue::Json(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => SqlValue::Null,
        }
    }
}

/// Build a value list for IN / NOT IN predicates
impl<T: Into<SqlValue>> FromIterator<T> for SqlValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        SqlValue::List(iter.into_iter().map(Into::into).collect())
    }
}

// Date/Time type conversions
impl From<chrono::DateTime<chrono::Utc>> for SqlValue {
    fn from(dt: chrono::DateTime<chrono::Utc>) -> Self {
        SqlValue::DateTime(dt.to_rfc3339())
    }
}

impl From<chrono::NaiveDate> for SqlValue {
    fn from(date: chrono::NaiveDate) -> Self {
        SqlValue::Date(date.to_string())
    }
}

impl From<chrono::NaiveTime> for SqlValue {
    fn from(time: chrono::NaiveTime) -> Self {
        SqlValue::Time(time.to_string())
    }
}

impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(dt: chrono::NaiveDateTime) -> Self {
        SqlValue::DateTime(dt.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for SqlValue {
    fn from(uuid: uuid::Uuid) -> Self {
        SqlValue::Uuid(uuid.to_string())
    }
}

#[cfg(feature = "decimal")]
impl From<rust_decimal::Decimal> for SqlValue {
    fn from(d: rust_decimal::Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}
