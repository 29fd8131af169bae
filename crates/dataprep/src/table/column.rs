//! A single named, typed column.

use super::types::{ColumnType, Value};

/// One column of a [`super::Table`]: a name, a semantic type, and values.
/// Values are homogeneous with the column type, up to nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column label.
    pub name: String,
    /// Semantic type shared by all non-null values.
    pub ty: ColumnType,
    /// Cell values in row order.
    pub values: Vec<Value>,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, ty: ColumnType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            ty,
            values,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of null values.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    /// Non-null numeric values paired with their row indices.
    pub fn numeric_values(&self) -> Vec<(usize, f64)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.as_f64().map(|n| (idx, n)))
            .collect()
    }

    /// Approximate in-memory footprint in bytes.
    pub fn approx_bytes(&self) -> usize {
        self.name.len() + self.values.iter().map(Value::approx_bytes).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_count() {
        let col = Column::new(
            "x",
            ColumnType::Integer,
            vec![Value::Int(1), Value::Null, Value::Int(3)],
        );
        assert_eq!(col.len(), 3);
        assert_eq!(col.null_count(), 1);
    }

    #[test]
    fn test_numeric_values_keep_row_indices() {
        let col = Column::new(
            "x",
            ColumnType::Float,
            vec![Value::Float(1.5), Value::Null, Value::Int(3)],
        );
        assert_eq!(col.numeric_values(), vec![(0, 1.5), (2, 3.0)]);
    }
}
