//! Ordered collection of equal-length columns.

use crate::error::{DataPrepError, Result};

use super::column::Column;
use super::types::Value;

/// An ordered sequence of named columns, all sharing the same row count.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Create a table from columns, enforcing the equal-length invariant.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        if let Some(first) = columns.first() {
            let rows = first.len();
            if let Some(bad) = columns.iter().find(|c| c.len() != rows) {
                return Err(DataPrepError::InvalidArgument(format!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.len(),
                    rows
                )));
            }
        }
        Ok(Self { columns })
    }

    /// Build a table from columns already known to share one row count,
    /// such as columns carried over from an existing table.
    pub(crate) fn from_equal_columns(columns: Vec<Column>) -> Self {
        debug_assert!(columns.windows(2).all(|w| w[0].len() == w[1].len()));
        Self { columns }
    }

    /// Create an empty table with no columns.
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// All columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column labels in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Cell values of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns
            .iter()
            .filter_map(|c| c.values.get(index))
            .collect()
    }

    /// Append a column, enforcing the equal-length invariant.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(DataPrepError::InvalidArgument(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.row_count()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Replace the column at `index`, enforcing the equal-length invariant.
    pub fn replace_column(&mut self, index: usize, column: Column) -> Result<()> {
        if index >= self.columns.len() {
            return Err(DataPrepError::InvalidArgument(format!(
                "column index {index} out of range"
            )));
        }
        if column.len() != self.row_count() {
            return Err(DataPrepError::InvalidArgument(format!(
                "column '{}' has {} rows, expected {}",
                column.name,
                column.len(),
                self.row_count()
            )));
        }
        self.columns[index] = column;
        Ok(())
    }

    /// Total null values across all columns.
    pub fn total_null_count(&self) -> usize {
        self.columns.iter().map(Column::null_count).sum()
    }

    /// Number of rows that are exact duplicates of an earlier row
    /// (full-row equality, occurrences after the first).
    pub fn duplicate_row_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = 0;
        for idx in 0..self.row_count() {
            let key = self
                .row(idx)
                .iter()
                .map(|v| v.fingerprint())
                .collect::<Vec<_>>()
                .join("\u{1f}");
            if !seen.insert(key) {
                duplicates += 1;
            }
        }
        duplicates
    }

    /// Approximate in-memory footprint in bytes.
    pub fn approx_memory_bytes(&self) -> usize {
        self.columns.iter().map(Column::approx_bytes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    fn int_col(name: &str, values: Vec<i64>) -> Column {
        Column::new(
            name,
            ColumnType::Integer,
            values.into_iter().map(Value::Int).collect(),
        )
    }

    #[test]
    fn test_equal_length_invariant() {
        let result = Table::new(vec![int_col("a", vec![1, 2]), int_col("b", vec![1])]);
        assert!(matches!(result, Err(DataPrepError::InvalidArgument(_))));
    }

    #[test]
    fn test_row_access() {
        let table = Table::new(vec![
            int_col("a", vec![1, 2]),
            int_col("b", vec![10, 20]),
        ])
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.row(1), vec![&Value::Int(2), &Value::Int(20)]);
    }

    #[test]
    fn test_duplicate_row_count() {
        let table = Table::new(vec![
            int_col("a", vec![1, 2, 1, 1]),
            int_col("b", vec![9, 8, 9, 9]),
        ])
        .unwrap();
        // Rows 2 and 3 repeat row 0.
        assert_eq!(table.duplicate_row_count(), 2);
    }

    #[test]
    fn test_push_column_length_mismatch() {
        let mut table = Table::new(vec![int_col("a", vec![1, 2])]).unwrap();
        let result = table.push_column(int_col("b", vec![1]));
        assert!(result.is_err());
        assert_eq!(table.column_count(), 1);
    }
}
