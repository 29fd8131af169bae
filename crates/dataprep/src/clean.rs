//! Column-label normalization and date decomposition.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::info;

use crate::error::{DataPrepError, Result};
use crate::table::{Column, ColumnType, Table, Value};

/// Timestamp formats tried during auto-detection, in priority order.
/// The flag marks formats that carry a time component. Ambiguous
/// `xx/xx/YYYY` values resolve month-first (US order).
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%Y-%m-%dT%H:%M:%S%.f", true),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y-%m-%d", false),
    ("%Y/%m/%d", false),
    ("%m/%d/%Y", false),
    ("%d/%m/%Y", false),
    ("%d-%m-%Y", false),
];

/// Parse a timestamp by trying each known format in order.
pub(crate) fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for &(format, has_time) in DATE_FORMATS {
        if has_time {
            if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(ts);
            }
        } else if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Parse a timestamp with an explicit chrono format string.
pub(crate) fn parse_with_format(value: &str, format: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// First known format that parses every value, in priority order.
///
/// A whole column is interpreted with a single format; picking a format
/// per value would let `01/02/2024` and `01/13/2024` land on different
/// day/month orders in adjacent rows.
pub(crate) fn detect_column_format(values: &[&str]) -> Option<&'static str> {
    DATE_FORMATS
        .iter()
        .map(|&(format, _)| format)
        .find(|format| values.iter().all(|v| parse_with_format(v, format).is_some()))
}

/// Normalize one column label: trim, lowercase, whitespace to `_`, strip
/// everything outside `[a-z0-9_]`, collapse repeated `_`, trim edge `_`.
/// Lowercasing happens before the strip so case never affects what is kept.
fn clean_label(label: &str) -> String {
    let lowered = label.trim().to_lowercase();

    let mut cleaned = String::with_capacity(lowered.len());
    let mut prev_underscore = false;
    for ch in lowered.chars() {
        let mapped = if ch.is_whitespace() { '_' } else { ch };
        if mapped == '_' {
            if !prev_underscore {
                cleaned.push('_');
            }
            prev_underscore = true;
        } else if mapped.is_ascii_alphanumeric() {
            cleaned.push(mapped);
            prev_underscore = false;
        }
        // Everything else is dropped without resetting the underscore run,
        // so "a - b" still collapses to "a_b".
    }

    cleaned.trim_matches('_').to_string()
}

/// Return a copy of the table with normalized column labels.
/// The input table is never mutated; the operation is idempotent.
pub fn clean_column_names(table: &Table) -> Table {
    let columns = table
        .columns()
        .iter()
        .map(|c| Column::new(clean_label(&c.name), c.ty, c.values.clone()))
        .collect();

    // Equal lengths are inherited from the input table.
    let cleaned = Table::from_equal_columns(columns);
    info!("column names cleaned: {:?}", cleaned.column_names());
    cleaned
}

/// Base name for derived calendar columns: the first `_date` occurrence is
/// removed, otherwise the first `date_` occurrence.
fn derived_base_name(column: &str) -> String {
    if column.contains("_date") {
        column.replacen("_date", "", 1)
    } else if column.contains("date_") {
        column.replacen("date_", "", 1)
    } else {
        column.to_string()
    }
}

/// Parse `column` as timestamps and append six derived calendar columns:
/// `{base}_year`, `_month`, `_day`, `_day_name`, `_quarter`, `_is_weekend`
/// (ISO weekday >= 6). Without an explicit format, one format is chosen
/// for the whole column: the first known format that parses every
/// non-null value. Returns a copy; when no format fits the whole
/// operation fails with `DateParse` and nothing is derived.
pub fn process_dates(table: &Table, column: &str, format: Option<&str>) -> Result<Table> {
    let index = table.column_index(column).ok_or_else(|| {
        DataPrepError::InvalidArgument(format!("no column named '{column}'"))
    })?;
    let source = &table.columns()[index];

    let mut texts: Vec<&str> = Vec::new();
    for value in &source.values {
        match value {
            Value::Null | Value::Timestamp(_) => {}
            Value::Text(s) => texts.push(s),
            other => {
                return Err(DataPrepError::DateParse {
                    column: column.to_string(),
                    value: other.to_string(),
                });
            }
        }
    }

    let chosen = match format {
        Some(f) => Some(f),
        None if texts.is_empty() => None,
        None => Some(detect_column_format(&texts).ok_or_else(|| {
            // Report a value no single format covers; when every value
            // parses in isolation, the first one names the conflict.
            let value = texts
                .iter()
                .find(|v| parse_timestamp(v).is_none())
                .copied()
                .unwrap_or(texts[0]);
            DataPrepError::DateParse {
                column: column.to_string(),
                value: value.to_string(),
            }
        })?),
    };

    // Parse every value before touching the output table.
    let mut timestamps: Vec<Option<NaiveDateTime>> = Vec::with_capacity(source.len());
    for value in &source.values {
        let parsed = match value {
            Value::Null => None,
            Value::Timestamp(ts) => Some(*ts),
            Value::Text(s) => {
                let ts = chosen.and_then(|f| parse_with_format(s, f));
                Some(ts.ok_or_else(|| DataPrepError::DateParse {
                    column: column.to_string(),
                    value: s.clone(),
                })?)
            }
            // Non-text kinds were rejected above.
            _ => None,
        };
        timestamps.push(parsed);
    }

    let base = derived_base_name(column);
    let derive = |f: &dyn Fn(NaiveDateTime) -> Value| -> Vec<Value> {
        timestamps
            .iter()
            .map(|ts| ts.map(f).unwrap_or(Value::Null))
            .collect()
    };

    let mut processed = table.clone();
    processed.replace_column(
        index,
        Column::new(
            column,
            ColumnType::Timestamp,
            timestamps
                .iter()
                .map(|ts| ts.map(Value::Timestamp).unwrap_or(Value::Null))
                .collect(),
        ),
    )?;

    let derived: [(String, ColumnType, Vec<Value>); 6] = [
        (
            format!("{base}_year"),
            ColumnType::Integer,
            derive(&|ts| Value::Int(i64::from(ts.year()))),
        ),
        (
            format!("{base}_month"),
            ColumnType::Integer,
            derive(&|ts| Value::Int(i64::from(ts.month()))),
        ),
        (
            format!("{base}_day"),
            ColumnType::Integer,
            derive(&|ts| Value::Int(i64::from(ts.day()))),
        ),
        (
            format!("{base}_day_name"),
            ColumnType::Text,
            derive(&|ts| Value::Text(ts.format("%A").to_string())),
        ),
        (
            format!("{base}_quarter"),
            ColumnType::Integer,
            derive(&|ts| Value::Int(i64::from(ts.month0() / 3 + 1))),
        ),
        (
            format!("{base}_is_weekend"),
            ColumnType::Boolean,
            derive(&|ts| Value::Bool(ts.weekday().number_from_monday() >= 6)),
        ),
    ];
    for (name, ty, values) in derived {
        processed.push_column(Column::new(name, ty, values))?;
    }

    info!(
        "column '{}' processed into calendar components (base '{}')",
        column, base
    );
    Ok(processed)
}
