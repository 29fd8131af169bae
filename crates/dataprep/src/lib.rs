//! dataprep: auto-detecting tabular file loader, executive-summary
//! generator, and project file catalog.
//!
//! The pipeline mirrors how small data projects actually move files
//! around: a [`FileCatalog`] resolves a path inside a fixed
//! `data/{input,result,logs}` layout, the [`TableLoader`] (backed by
//! [`sniff::FormatSniffer`]) parses it into a typed [`Table`], the
//! [`clean`] operations normalize it, the [`summary`] operations report on
//! it, and the catalog persists the results with timestamped names.
//!
//! # Example
//!
//! ```no_run
//! use dataprep::{TableLoader, clean, summary};
//!
//! let table = TableLoader::new().load("data/input/sales.csv").unwrap();
//! let table = clean::clean_column_names(&table);
//! let report = summary::validate(&table, "sales");
//!
//! println!("{} rows, {} duplicates", report.rows, report.duplicate_rows);
//! ```

pub mod catalog;
pub mod clean;
pub mod error;
pub mod load;
pub mod sniff;
pub mod summary;
pub mod table;

pub use catalog::{DirKey, FileCatalog, FileEntry, FilesReport, SaveFormat};
pub use error::{DataPrepError, Result};
pub use load::{IntegrityReport, TableLoader};
pub use sniff::{FormatDecision, FormatSniffer};
pub use summary::{ExecutiveSummary, OutlierReport, ValidationReport};
pub use table::{Column, ColumnType, Table, Value};
