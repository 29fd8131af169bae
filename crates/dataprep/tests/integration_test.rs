//! End-to-end tests for the load → clean → summarize → save pipeline.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use dataprep::{
    ColumnType, DataPrepError, DirKey, FileCatalog, SaveFormat, TableLoader, Value, clean, summary,
};

/// Helper to write a fixture file into a temp directory.
fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("failed to create fixture");
    file.write_all(content).expect("failed to write fixture");
    path
}

// =============================================================================
// Sniffing and loading
// =============================================================================

#[test]
fn test_semicolon_csv_parsed_with_detected_pair() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "ventas.csv",
        b"producto;cantidad;precio\nA;1;9.5\nB;2;12.0\nC;3;7.25\n\
          D;4;5.0\nE;5;8.75\nF;6;11.5\n",
    );

    let table = TableLoader::new().load(&path).expect("load failed");
    // All six data rows, parsed with ';' after the sample-only sniff.
    assert_eq!(table.row_count(), 6);
    assert_eq!(table.column_names(), vec!["producto", "cantidad", "precio"]);
    assert_eq!(table.column("cantidad").unwrap().ty, ColumnType::Integer);
    assert_eq!(table.column("precio").unwrap().ty, ColumnType::Float);
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "data.parquet", b"whatever");

    let result = TableLoader::new().load(&path);
    assert!(matches!(result, Err(DataPrepError::UnsupportedFormat(_))));
}

// =============================================================================
// Full pipeline
// =============================================================================

#[test]
fn test_load_clean_dates_summarize() {
    let dir = TempDir::new().unwrap();
    let path = write_file(
        &dir,
        "orders.csv",
        b"Order Date,AMOUNT ($),Region\n\
          2024-01-06,100,North\n\
          2024-01-07,250,South\n\
          2024-01-08,NA,North\n",
    );

    let table = TableLoader::new().load(&path).unwrap();
    let table = clean::clean_column_names(&table);
    assert_eq!(table.column_names(), vec!["order_date", "amount", "region"]);

    let table = clean::process_dates(&table, "order_date", None).unwrap();
    assert_eq!(
        table.column("order_is_weekend").unwrap().values,
        vec![Value::Bool(true), Value::Bool(true), Value::Bool(false)]
    );

    let summary = summary::summarize(&table, None, None);
    let amount = &summary.numeric_columns["amount"];
    assert_eq!(amount.count, 2);
    assert_eq!(amount.null_values, 1);
    assert_eq!(amount.mean, Some(175.0));
    assert!(summary.categorical_columns.contains_key("region"));
}

// =============================================================================
// Catalog round trips
// =============================================================================

#[test]
fn test_save_load_round_trip_all_formats() {
    let dir = TempDir::new().unwrap();
    let catalog = FileCatalog::new(dir.path()).unwrap();

    let source = write_file(
        &dir,
        "source.csv",
        b"name,score,passed\nAlice,9.5,true\nBob,7.0,false\nCarol,8.25,true\n",
    );
    let table = TableLoader::new().load(&source).unwrap();

    for format in [
        SaveFormat::DelimitedText,
        SaveFormat::Structured,
        SaveFormat::Spreadsheet,
    ] {
        let path = catalog.save(&table, "round_trip", false, format).unwrap();
        let loaded = catalog
            .load(&path.file_name().unwrap().to_string_lossy(), DirKey::Result)
            .unwrap();

        assert_eq!(loaded.row_count(), table.row_count(), "{format:?}");
        assert_eq!(loaded.column_count(), table.column_count(), "{format:?}");
        // Values survive; the spreadsheet format may normalize numeric
        // types, so only the exact-text formats are checked for them.
        if format != SaveFormat::Spreadsheet {
            assert_eq!(loaded.column("score").unwrap().ty, ColumnType::Float);
        }
        assert_eq!(loaded.column("passed").unwrap().ty, ColumnType::Boolean);
    }
}

#[test]
fn test_catalog_report_after_pipeline() {
    let dir = TempDir::new().unwrap();
    let catalog = FileCatalog::new(dir.path()).unwrap();

    let source = write_file(&dir, "in.csv", b"a,b\n1,2\n3,4\n");
    let table = TableLoader::new().load(&source).unwrap();
    catalog
        .save(&table, "clean", true, SaveFormat::DelimitedText)
        .unwrap();

    let report = catalog.report().unwrap();
    assert_eq!(report.directories["result"].total_files, 1);
    assert_eq!(report.directories["result"].extensions[".csv"].count, 1);
    assert_eq!(report.directories["input"].total_files, 0);

    let metadata_path = catalog.export_metadata("project_metadata").unwrap();
    assert!(metadata_path.exists());
}
