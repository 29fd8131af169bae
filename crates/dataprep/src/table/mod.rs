//! In-memory tabular data model.

mod column;
mod table;
mod types;

pub use column::Column;
pub use table::Table;
pub use types::{ColumnType, Value};
