//! Example: load a tabular file, clean it, and print an executive summary.
//!
//! Usage:
//!   cargo run --example analyze -- <file_path> [date_column]

use std::env;
use std::path::Path;

use dataprep::{TableLoader, clean, summary};

fn main() -> dataprep::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --example analyze -- <file_path> [date_column]");
        std::process::exit(1);
    }

    let file_path = &args[1];
    if !Path::new(file_path).exists() {
        eprintln!("Error: file not found: {file_path}");
        std::process::exit(1);
    }

    let table = TableLoader::new().load(file_path)?;
    let mut table = clean::clean_column_names(&table);
    if let Some(date_column) = args.get(2) {
        table = clean::process_dates(&table, date_column, None)?;
    }

    let report = summary::validate(&table, file_path);
    println!("## Validation");
    println!("  Rows: {}", report.rows);
    println!("  Columns: {}", report.columns);
    println!("  Null values: {}", report.null_values);
    println!("  Duplicate rows: {}", report.duplicate_rows);
    println!("  Columns with nulls: {:?}", report.columns_with_nulls);
    println!();

    let summary = summary::summarize(&table, None, None);
    println!("## Executive summary");
    println!(
        "  Completeness: {:.1}%",
        summary.data_quality.completeness_percentage
    );
    for (name, profile) in &summary.numeric_columns {
        println!(
            "  {:20} count={:<6} mean={:?} min={:?} max={:?}",
            name, profile.count, profile.mean, profile.min, profile.max
        );
    }
    for (name, profile) in &summary.categorical_columns {
        println!(
            "  {:20} unique={:<5} most frequent={:?} ({})",
            name, profile.unique_values, profile.most_frequent_value, profile.max_frequency
        );
    }

    Ok(())
}
