//! Core type definitions for the tabular data model.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Whole numbers (no decimal point).
    Integer,
    /// Floating-point numbers.
    Float,
    /// Text/string values.
    Text,
    /// Boolean values (true/false).
    Boolean,
    /// Date and/or time values.
    Timestamp,
}

impl ColumnType {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        };
        f.write_str(name)
    }
}

/// A single cell value. Columns are homogeneous up to nulls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Whether this value is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Timestamp view of the value, if it has one.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Approximate in-memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        let heap = match self {
            Value::Text(s) => s.len(),
            _ => 0,
        };
        std::mem::size_of::<Value>() + heap
    }

    /// Stable key used for full-row duplicate detection. Distinguishes
    /// `Null` from the empty string and `Text("1")` from `Int(1)`.
    pub(crate) fn fingerprint(&self) -> String {
        match self {
            Value::Null => "n".to_string(),
            Value::Bool(b) => format!("b{b}"),
            Value::Int(i) => format!("i{i}"),
            Value::Float(f) => format!("f{f}"),
            Value::Timestamp(ts) => format!("d{ts}"),
            Value::Text(s) => format!("t{s}"),
        }
    }
}

impl fmt::Display for Value {
    /// Field rendering used when writing delimited text; null renders empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Timestamp(ts) => {
                if ts.time() == chrono::NaiveTime::MIN {
                    write!(f, "{}", ts.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S"))
                }
            }
            Value::Text(s) => f.write_str(s),
        }
    }
}
