//! Validation, outlier detection, and executive summaries.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, warn};

use crate::table::{Column, ColumnType, Table};

/// Default IQR multiplier for outlier bounds.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// How many top categorical values a profile keeps.
const TOP_VALUES: usize = 5;

/// Validation report for a whole table.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    /// Descriptive dataset name supplied by the caller.
    pub dataset: String,
    pub rows: usize,
    pub columns: usize,
    /// Total null values across all columns.
    pub null_values: usize,
    /// Rows that duplicate an earlier row (full-row equality).
    pub duplicate_rows: usize,
    /// Approximate in-memory size.
    pub approx_memory_bytes: usize,
    /// Columns containing at least one null.
    pub columns_with_nulls: Vec<String>,
    /// Per-column semantic types, in column order.
    pub data_types: IndexMap<String, ColumnType>,
}

/// IQR-based outlier report for one numeric column.
#[derive(Debug, Clone, Serialize)]
pub struct OutlierReport {
    pub column: String,
    /// Values examined, nulls included.
    pub total_values: usize,
    pub outliers_detected: usize,
    pub outliers_percentage: f64,
    /// Q1 - k*IQR; absent when the column has no values.
    pub lower_bound: Option<f64>,
    /// Q3 + k*IQR; absent when the column has no values.
    pub upper_bound: Option<f64>,
    /// Flagged values, in row order.
    pub outlier_values: Vec<f64>,
    /// Row indices of the flagged values.
    pub outlier_indices: Vec<usize>,
}

/// Table-level facts in an executive summary.
#[derive(Debug, Clone, Serialize)]
pub struct GeneralInfo {
    pub rows: usize,
    pub columns: usize,
    pub approx_memory_bytes: usize,
    pub analyzed_at: DateTime<Utc>,
}

/// Data-quality facts in an executive summary.
#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub total_null_values: usize,
    pub duplicate_rows: usize,
    /// Share of non-null cells, 0-100.
    pub completeness_percentage: f64,
}

/// Descriptive statistics for a numeric column. Statistics are absent
/// when there are no non-null values (std additionally needs two).
#[derive(Debug, Clone, Serialize)]
pub struct NumericProfile {
    /// Non-null value count.
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q25: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q50: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q75: Option<f64>,
    pub null_values: usize,
}

/// Frequency profile for a categorical column.
#[derive(Debug, Clone, Serialize)]
pub struct CategoricalProfile {
    pub unique_values: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_frequent_value: Option<String>,
    pub max_frequency: usize,
    pub null_values: usize,
    /// Top-5 value/frequency pairs, most frequent first.
    pub top_values: IndexMap<String, usize>,
}

/// Combined data-quality and per-column statistical report.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub general_information: GeneralInfo,
    pub data_quality: DataQuality,
    pub numeric_columns: IndexMap<String, NumericProfile>,
    pub categorical_columns: IndexMap<String, CategoricalProfile>,
}

/// Read-only validation pass over a table.
pub fn validate(table: &Table, dataset: &str) -> ValidationReport {
    let columns_with_nulls = table
        .columns()
        .iter()
        .filter(|c| c.null_count() > 0)
        .map(|c| c.name.clone())
        .collect();
    let data_types = table
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.ty))
        .collect();

    let report = ValidationReport {
        dataset: dataset.to_string(),
        rows: table.row_count(),
        columns: table.column_count(),
        null_values: table.total_null_count(),
        duplicate_rows: table.duplicate_row_count(),
        approx_memory_bytes: table.approx_memory_bytes(),
        columns_with_nulls,
        data_types,
    };

    info!(
        "validated {}: {} rows x {} columns, {} nulls, {} duplicates",
        report.dataset, report.rows, report.columns, report.null_values, report.duplicate_rows
    );
    report
}

/// Quantile with linear interpolation over sorted values; `q` in 0-1.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let low = position.floor() as usize;
    let high = position.ceil() as usize;
    if low == high {
        Some(sorted[low])
    } else {
        Some(sorted[low] + (position - low as f64) * (sorted[high] - sorted[low]))
    }
}

/// Detect outliers in a numeric column with the IQR method.
///
/// Non-numeric columns are skipped with `None` rather than an error,
/// since outlier bounds are meaningless for categorical data.
pub fn detect_outliers(column: &Column, multiplier: f64) -> Option<OutlierReport> {
    if !column.ty.is_numeric() {
        warn!(
            "column '{}' is not numeric, skipping outlier detection",
            column.name
        );
        return None;
    }

    let numeric = column.numeric_values();
    let mut sorted: Vec<f64> = numeric.iter().map(|(_, v)| *v).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let bounds = q1.zip(q3).map(|(q1, q3)| {
        let iqr = q3 - q1;
        (q1 - multiplier * iqr, q3 + multiplier * iqr)
    });

    let (outlier_indices, outlier_values): (Vec<usize>, Vec<f64>) = match bounds {
        Some((lower, upper)) => numeric
            .iter()
            .filter(|(_, v)| *v < lower || *v > upper)
            .copied()
            .unzip(),
        None => (Vec::new(), Vec::new()),
    };

    let total_values = column.len();
    let percentage = if total_values == 0 {
        0.0
    } else {
        outlier_indices.len() as f64 / total_values as f64 * 100.0
    };

    info!(
        "outliers in '{}': {} ({:.1}%)",
        column.name,
        outlier_indices.len(),
        percentage
    );
    Some(OutlierReport {
        column: column.name.clone(),
        total_values,
        outliers_detected: outlier_indices.len(),
        outliers_percentage: percentage,
        lower_bound: bounds.map(|(l, _)| l),
        upper_bound: bounds.map(|(_, u)| u),
        outlier_values,
        outlier_indices,
    })
}

/// Profile one numeric column.
fn numeric_profile(column: &Column) -> NumericProfile {
    let mut values: Vec<f64> = column.numeric_values().iter().map(|(_, v)| *v).collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let count = values.len();

    let mean = if count == 0 {
        None
    } else {
        Some(values.iter().sum::<f64>() / count as f64)
    };
    // Sample standard deviation; undefined below two values.
    let std = mean.filter(|_| count >= 2).map(|m| {
        let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        (sum_sq / (count - 1) as f64).sqrt()
    });

    NumericProfile {
        count,
        mean,
        std,
        min: values.first().copied(),
        max: values.last().copied(),
        q25: quantile(&values, 0.25),
        q50: quantile(&values, 0.50),
        q75: quantile(&values, 0.75),
        null_values: column.null_count(),
    }
}

/// Profile one categorical column.
fn categorical_profile(column: &Column) -> CategoricalProfile {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for value in &column.values {
        if !value.is_null() {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));

    let most_frequent = counts.first().map(|(v, _)| v.clone());
    let max_frequency = counts.first().map(|(_, c)| *c).unwrap_or(0);
    let top_values: IndexMap<String, usize> = counts
        .iter()
        .take(TOP_VALUES)
        .map(|(v, c)| (v.clone(), *c))
        .collect();

    CategoricalProfile {
        unique_values: counts.len(),
        most_frequent_value: most_frequent,
        max_frequency,
        null_values: column.null_count(),
        top_values,
    }
}

/// Build an executive summary of a table.
///
/// When column subsets are not supplied, every column is classified by its
/// stored type: numeric columns get a [`NumericProfile`], everything else a
/// [`CategoricalProfile`]. Named columns absent from the table are skipped.
pub fn summarize(
    table: &Table,
    numeric_columns: Option<&[&str]>,
    categorical_columns: Option<&[&str]>,
) -> ExecutiveSummary {
    let numeric_names: Vec<String> = match numeric_columns {
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => table
            .columns()
            .iter()
            .filter(|c| c.ty.is_numeric())
            .map(|c| c.name.clone())
            .collect(),
    };
    let categorical_names: Vec<String> = match categorical_columns {
        Some(names) => names.iter().map(|n| n.to_string()).collect(),
        None => table
            .columns()
            .iter()
            .filter(|c| !c.ty.is_numeric())
            .map(|c| c.name.clone())
            .collect(),
    };

    let cells = table.row_count() * table.column_count();
    let nulls = table.total_null_count();
    let completeness = if cells == 0 {
        100.0
    } else {
        (cells - nulls) as f64 / cells as f64 * 100.0
    };

    let mut numeric = IndexMap::new();
    for name in numeric_names {
        if let Some(column) = table.column(&name) {
            numeric.insert(name, numeric_profile(column));
        }
    }
    let mut categorical = IndexMap::new();
    for name in categorical_names {
        if let Some(column) = table.column(&name) {
            categorical.insert(name, categorical_profile(column));
        }
    }

    info!(
        "executive summary generated: {} numeric, {} categorical columns",
        numeric.len(),
        categorical.len()
    );
    ExecutiveSummary {
        general_information: GeneralInfo {
            rows: table.row_count(),
            columns: table.column_count(),
            approx_memory_bytes: table.approx_memory_bytes(),
            analyzed_at: Utc::now(),
        },
        data_quality: DataQuality {
            total_null_values: nulls,
            duplicate_rows: table.duplicate_row_count(),
            completeness_percentage: completeness,
        },
        numeric_columns: numeric,
        categorical_columns: categorical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    fn float_col(name: &str, values: &[f64]) -> Column {
        Column::new(
            name,
            ColumnType::Float,
            values.iter().map(|v| Value::Float(*v)).collect(),
        )
    }

    fn text_col(name: &str, values: &[&str]) -> Column {
        Column::new(
            name,
            ColumnType::Text,
            values.iter().map(|v| Value::Text(v.to_string())).collect(),
        )
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 1000.0];
        assert_eq!(quantile(&values, 0.25), Some(2.25));
        assert_eq!(quantile(&values, 0.75), Some(4.75));
        assert_eq!(quantile(&values, 0.5), Some(3.5));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_detect_outliers_flags_extreme_value() {
        let column = float_col("x", &[1.0, 2.0, 3.0, 4.0, 5.0, 1000.0]);
        let report = detect_outliers(&column, DEFAULT_IQR_MULTIPLIER).unwrap();

        assert_eq!(report.outliers_detected, 1);
        assert_eq!(report.outlier_values, vec![1000.0]);
        assert_eq!(report.outlier_indices, vec![5]);
        assert_eq!(report.upper_bound, Some(8.5));
        assert_eq!(report.lower_bound, Some(-1.5));
    }

    #[test]
    fn test_detect_outliers_non_numeric_is_none() {
        let column = text_col("category", &["a", "b", "c"]);
        assert!(detect_outliers(&column, DEFAULT_IQR_MULTIPLIER).is_none());
    }

    #[test]
    fn test_detect_outliers_empty_numeric_column() {
        let column = Column::new("x", ColumnType::Float, vec![Value::Null, Value::Null]);
        let report = detect_outliers(&column, DEFAULT_IQR_MULTIPLIER).unwrap();
        assert_eq!(report.outliers_detected, 0);
        assert_eq!(report.lower_bound, None);
    }

    #[test]
    fn test_validate_reports_nulls_and_duplicates() {
        let table = Table::new(vec![
            Column::new(
                "a",
                ColumnType::Integer,
                vec![Value::Int(1), Value::Null, Value::Int(1)],
            ),
            text_col("b", &["x", "y", "x"]),
        ])
        .unwrap();

        let report = validate(&table, "test");
        assert_eq!(report.rows, 3);
        assert_eq!(report.null_values, 1);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(report.columns_with_nulls, vec!["a"]);
        assert_eq!(report.data_types["b"], ColumnType::Text);
    }

    #[test]
    fn test_summarize_auto_classification() {
        let table = Table::new(vec![
            float_col("amount", &[1.0, 2.0, 3.0]),
            text_col("region", &["north", "south", "north"]),
        ])
        .unwrap();

        let summary = summarize(&table, None, None);
        assert!(summary.numeric_columns.contains_key("amount"));
        assert!(summary.categorical_columns.contains_key("region"));

        let region = &summary.categorical_columns["region"];
        assert_eq!(region.unique_values, 2);
        assert_eq!(region.most_frequent_value.as_deref(), Some("north"));
        assert_eq!(region.max_frequency, 2);
    }

    #[test]
    fn test_summarize_fully_null_numeric_column() {
        let table = Table::new(vec![Column::new(
            "empty",
            ColumnType::Float,
            vec![Value::Null, Value::Null, Value::Null],
        )])
        .unwrap();

        let summary = summarize(&table, None, None);
        let profile = &summary.numeric_columns["empty"];
        assert_eq!(profile.count, 0);
        assert_eq!(profile.mean, None);
        assert_eq!(profile.std, None);
        assert_eq!(profile.null_values, 3);
    }

    #[test]
    fn test_summarize_skips_absent_columns() {
        let table = Table::new(vec![float_col("x", &[1.0])]).unwrap();
        let summary = summarize(&table, Some(&["x", "ghost"]), Some(&["phantom"]));
        assert_eq!(summary.numeric_columns.len(), 1);
        assert!(summary.categorical_columns.is_empty());
    }

    #[test]
    fn test_completeness_percentage() {
        let table = Table::new(vec![Column::new(
            "a",
            ColumnType::Integer,
            vec![Value::Int(1), Value::Null, Value::Int(3), Value::Int(4)],
        )])
        .unwrap();

        let summary = summarize(&table, None, None);
        assert!((summary.data_quality.completeness_percentage - 75.0).abs() < 1e-9);
    }
}
