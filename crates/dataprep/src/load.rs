//! Format-dispatching table loader.

use std::path::{Path, PathBuf};

use calamine::{DataType, Reader, open_workbook_auto};
use serde::Serialize;
use tracing::info;

use crate::clean::{detect_column_format, parse_with_format};
use crate::error::{DataPrepError, Result};
use crate::sniff::{FileKind, FormatSniffer, TextEncoding};
use crate::table::{Column, ColumnType, Table, Value};

/// Tokens treated as missing values in delimited and spreadsheet input.
const NULL_TOKENS: &[&str] = &["na", "n/a", "null", "none", "nil", ".", "-"];

/// Check if a raw field represents a missing value.
pub fn is_null_token(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NULL_TOKENS.iter().any(|t| trimmed.eq_ignore_ascii_case(t))
}

/// Readability probe result for a single file.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub path: PathBuf,
    pub exists: bool,
    pub is_file: bool,
    pub size_bytes: u64,
    pub extension: String,
    pub readable: bool,
    pub rows: usize,
    pub columns: usize,
    pub errors: Vec<String>,
}

/// Loads a file into a [`Table`], dispatching on the sniffed format.
pub struct TableLoader;

impl TableLoader {
    /// Create a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Load a file into a typed table.
    ///
    /// The sniffing step only validates a small sample; the confirmed
    /// delimiter/encoding pair is then used to re-parse the entire file.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataPrepError::FileNotFound(path.to_path_buf()));
        }

        let decision = FormatSniffer::sniff(path)?;
        let table = match decision.kind {
            FileKind::DelimitedText => {
                // Sniff defaults guarantee both are present for this kind.
                let delimiter = decision.delimiter.unwrap_or(b',');
                let encoding = decision.encoding.unwrap_or(TextEncoding::Utf8);
                self.load_delimited(path, delimiter, encoding)?
            }
            FileKind::Structured => self.load_structured(path)?,
            FileKind::Spreadsheet => self.load_spreadsheet(path)?,
        };

        info!(
            "loaded {}: {} rows x {} columns ({} bytes in memory)",
            path.display(),
            table.row_count(),
            table.column_count(),
            table.approx_memory_bytes()
        );
        Ok(table)
    }

    /// Validate that a file exists and is readable as tabular data.
    pub fn probe(&self, path: impl AsRef<Path>) -> IntegrityReport {
        let path = path.as_ref();
        let mut report = IntegrityReport {
            path: path.to_path_buf(),
            exists: path.exists(),
            is_file: path.is_file(),
            size_bytes: path.metadata().map(|m| m.len()).unwrap_or(0),
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default(),
            readable: false,
            rows: 0,
            columns: 0,
            errors: Vec::new(),
        };

        if !report.exists {
            report.errors.push("file does not exist".to_string());
            return report;
        }
        if !report.is_file {
            report.errors.push("path is not a regular file".to_string());
            return report;
        }
        if report.size_bytes == 0 {
            report.errors.push("file is empty".to_string());
            return report;
        }

        match self.load(path) {
            Ok(table) => {
                report.readable = true;
                report.rows = table.row_count();
                report.columns = table.column_count();
            }
            Err(e) => report.errors.push(e.to_string()),
        }
        report
    }

    /// Re-parse the whole file with the confirmed delimiter and encoding.
    fn load_delimited(&self, path: &Path, delimiter: u8, encoding: TextEncoding) -> Result<Table> {
        let bytes = std::fs::read(path).map_err(|e| DataPrepError::io(path, e))?;
        let decoded = encoding.decode(&bytes).ok_or_else(|| {
            DataPrepError::parse(path, format!("content is not valid {encoding}"))
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(decoded.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.to_string())
            .collect();
        if headers.is_empty() {
            return Err(DataPrepError::parse(path, "no columns found"));
        }

        let width = headers.len();
        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
            // Ragged rows are padded or truncated to the header width.
            row.resize(width, String::new());
            rows.push(row);
        }

        build_typed_table(headers, rows)
    }

    /// Parse a JSON array of records.
    fn load_structured(&self, path: &Path) -> Result<Table> {
        let text = std::fs::read_to_string(path).map_err(|e| DataPrepError::io(path, e))?;
        let records: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_str(&text)
                .map_err(|e| DataPrepError::parse(path, e.to_string()))?;

        // Column order follows first-encounter order across records.
        let mut names: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }

        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let values: Vec<Value> = records
                .iter()
                .map(|record| match record.get(&name) {
                    None | Some(serde_json::Value::Null) => Value::Null,
                    Some(serde_json::Value::Bool(b)) => Value::Bool(*b),
                    Some(serde_json::Value::Number(n)) => {
                        if let Some(i) = n.as_i64() {
                            Value::Int(i)
                        } else {
                            Value::Float(n.as_f64().unwrap_or(f64::NAN))
                        }
                    }
                    Some(serde_json::Value::String(s)) => Value::Text(s.clone()),
                    Some(other) => Value::Text(other.to_string()),
                })
                .collect();
            columns.push(unify_column(name, values));
        }
        Table::new(columns)
    }

    /// Parse the first worksheet of an Excel workbook.
    fn load_spreadsheet(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)
            .map_err(|e| DataPrepError::Spreadsheet(e.to_string()))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DataPrepError::parse(path, "no worksheet found"))?
            .map_err(|e| DataPrepError::Spreadsheet(e.to_string()))?;

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            return Ok(Table::empty());
        };

        let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();
        let width = headers.len();
        let data: Vec<Vec<String>> = rows
            .map(|row| {
                let mut fields: Vec<String> = row.iter().map(cell_to_string).collect();
                fields.resize(width, String::new());
                fields
            })
            .collect();

        build_typed_table(headers, data)
    }
}

impl Default for TableLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a spreadsheet cell as a raw field for type inference.
fn cell_to_string(cell: &calamine::Data) -> String {
    cell.as_string().unwrap_or_else(|| cell.to_string())
}

/// Build a typed table from raw string fields.
///
/// A column gets a non-text type only when every non-null field parses as
/// that type; integer columns containing any float are promoted to float.
fn build_typed_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Table> {
    let mut columns = Vec::with_capacity(headers.len());
    for (index, name) in headers.into_iter().enumerate() {
        let raws: Vec<&str> = rows
            .iter()
            .map(|row| row.get(index).map(String::as_str).unwrap_or(""))
            .collect();
        columns.push(infer_column(name, &raws));
    }
    Table::new(columns)
}

/// Infer the type of one column and convert its fields.
fn infer_column(name: String, raws: &[&str]) -> Column {
    let non_null: Vec<&str> = raws
        .iter()
        .copied()
        .filter(|r| !is_null_token(r))
        .map(str::trim)
        .collect();

    let all =
        |pred: fn(&str) -> bool| !non_null.is_empty() && non_null.iter().copied().all(pred);

    // One format interprets the whole column, never a per-value choice.
    let date_format = if non_null.is_empty() {
        None
    } else {
        detect_column_format(&non_null)
    };

    let ty = if all(|v| v.parse::<i64>().is_ok()) {
        ColumnType::Integer
    } else if all(|v| v.parse::<f64>().is_ok()) {
        ColumnType::Float
    } else if all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false")) {
        ColumnType::Boolean
    } else if date_format.is_some() {
        ColumnType::Timestamp
    } else {
        ColumnType::Text
    };

    let values = raws
        .iter()
        .map(|raw| {
            if is_null_token(raw) {
                return Value::Null;
            }
            let trimmed = raw.trim();
            match ty {
                // Inference above guarantees these parses succeed.
                ColumnType::Integer => Value::Int(trimmed.parse().unwrap_or_default()),
                ColumnType::Float => Value::Float(trimmed.parse().unwrap_or_default()),
                ColumnType::Boolean => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
                ColumnType::Timestamp => date_format
                    .and_then(|f| parse_with_format(trimmed, f))
                    .map(Value::Timestamp)
                    .unwrap_or(Value::Null),
                ColumnType::Text => Value::Text(raw.to_string()),
            }
        })
        .collect();

    Column::new(name, ty, values)
}

/// Settle a column of already-typed values on a single column type.
fn unify_column(name: String, values: Vec<Value>) -> Column {
    let mut has_int = false;
    let mut has_float = false;
    let mut has_bool = false;
    let mut has_text = false;
    let mut has_ts = false;
    for value in &values {
        match value {
            Value::Null => {}
            Value::Int(_) => has_int = true,
            Value::Float(_) => has_float = true,
            Value::Bool(_) => has_bool = true,
            Value::Text(_) => has_text = true,
            Value::Timestamp(_) => has_ts = true,
        }
    }

    let kinds = [has_int, has_float, has_bool, has_text, has_ts]
        .iter()
        .filter(|k| **k)
        .count();

    if kinds <= 1 {
        let ty = match () {
            _ if has_int => ColumnType::Integer,
            _ if has_float => ColumnType::Float,
            _ if has_bool => ColumnType::Boolean,
            _ if has_ts => ColumnType::Timestamp,
            _ => ColumnType::Text,
        };
        return Column::new(name, ty, values);
    }

    if has_int && has_float && !has_bool && !has_text && !has_ts {
        let promoted = values
            .into_iter()
            .map(|v| match v {
                Value::Int(i) => Value::Float(i as f64),
                other => other,
            })
            .collect();
        return Column::new(name, ColumnType::Float, promoted);
    }

    // Mixed kinds degrade to text.
    let as_text = values
        .into_iter()
        .map(|v| match v {
            Value::Null => Value::Null,
            other => Value::Text(other.to_string()),
        })
        .collect();
    Column::new(name, ColumnType::Text, as_text)
}
