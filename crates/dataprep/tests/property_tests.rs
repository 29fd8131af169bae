//! Property-based tests for cleaning and summary invariants.

use proptest::prelude::*;

use dataprep::{Column, ColumnType, Table, Value, clean, summary};

/// Arbitrary column labels, including messy whitespace and symbols.
fn label() -> impl Strategy<Value = String> {
    "[ a-zA-Z0-9_$%()\\-\\.]{0,40}"
}

/// Arbitrary finite floats.
fn finite_f64() -> impl Strategy<Value = f64> {
    (-1.0e9..1.0e9f64)
}

fn table_with_labels(labels: Vec<String>) -> Table {
    let columns = labels
        .into_iter()
        .map(|l| Column::new(l, ColumnType::Text, vec![Value::Text("x".to_string())]))
        .collect();
    Table::new(columns).unwrap()
}

proptest! {
    /// Cleaning column names twice changes nothing after the first pass.
    #[test]
    fn clean_column_names_is_idempotent(labels in prop::collection::vec(label(), 1..6)) {
        let table = table_with_labels(labels);
        let once = clean::clean_column_names(&table);
        let twice = clean::clean_column_names(&once);
        prop_assert_eq!(once.column_names(), twice.column_names());
    }

    /// Cleaned labels only ever contain `[a-z0-9_]`, with no edge or
    /// doubled underscores.
    #[test]
    fn cleaned_labels_are_normalized(raw in label()) {
        let table = table_with_labels(vec![raw]);
        let cleaned = clean::clean_column_names(&table);
        let name = cleaned.column_names()[0].to_string();

        prop_assert!(name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
        prop_assert!(!name.starts_with('_'));
        prop_assert!(!name.ends_with('_'));
        prop_assert!(!name.contains("__"));
    }

    /// Outlier detection never panics and never flags values inside
    /// the reported bounds.
    #[test]
    fn outlier_bounds_are_consistent(values in prop::collection::vec(finite_f64(), 0..50)) {
        let column = Column::new(
            "x",
            ColumnType::Float,
            values.iter().map(|v| Value::Float(*v)).collect(),
        );
        let report = summary::detect_outliers(&column, 1.5).unwrap();

        prop_assert_eq!(report.outlier_values.len(), report.outlier_indices.len());
        if let (Some(lower), Some(upper)) = (report.lower_bound, report.upper_bound) {
            for value in &report.outlier_values {
                prop_assert!(*value < lower || *value > upper);
            }
        } else {
            prop_assert!(report.outlier_values.is_empty());
        }
    }

    /// Text columns are always skipped, whatever the content.
    #[test]
    fn outliers_on_text_columns_are_none(values in prop::collection::vec("[a-z0-9]{0,10}", 0..20)) {
        let column = Column::new(
            "words",
            ColumnType::Text,
            values.into_iter().map(Value::Text).collect(),
        );
        prop_assert!(summary::detect_outliers(&column, 1.5).is_none());
    }
}
