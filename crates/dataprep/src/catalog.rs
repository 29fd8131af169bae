//! Fixed project directory layout: listing, saving, backups, organization.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::error::{DataPrepError, Result};
use crate::load::TableLoader;
use crate::table::{Table, Value};

/// Timestamp suffix used in generated file names.
const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// The three managed directories under `data/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirKey {
    Input,
    Result,
    Logs,
}

impl DirKey {
    /// All keys, in layout order.
    pub const ALL: [DirKey; 3] = [DirKey::Input, DirKey::Result, DirKey::Logs];

    /// Relative directory name under `data/`.
    pub fn as_str(&self) -> &'static str {
        match self {
            DirKey::Input => "input",
            DirKey::Result => "result",
            DirKey::Logs => "logs",
        }
    }
}

impl fmt::Display for DirKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirKey {
    type Err = DataPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(DirKey::Input),
            "result" => Ok(DirKey::Result),
            "logs" => Ok(DirKey::Logs),
            other => Err(DataPrepError::InvalidArgument(format!(
                "directory must be one of input/result/logs, got '{other}'"
            ))),
        }
    }
}

/// Output format for [`FileCatalog::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// Excel workbook (`.xlsx`).
    Spreadsheet,
    /// UTF-8 CSV (`.csv`).
    DelimitedText,
    /// JSON array of records (`.json`).
    Structured,
}

impl SaveFormat {
    /// File extension written for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            SaveFormat::Spreadsheet => "xlsx",
            SaveFormat::DelimitedText => "csv",
            SaveFormat::Structured => "json",
        }
    }
}

impl FromStr for SaveFormat {
    type Err = DataPrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "xlsx" | "spreadsheet" => Ok(SaveFormat::Spreadsheet),
            "csv" | "delimited-text" => Ok(SaveFormat::DelimitedText),
            "json" | "structured" => Ok(SaveFormat::Structured),
            other => Err(DataPrepError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// One file known to the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    /// Lowercased extension including the dot, or empty.
    pub extension: String,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}

/// Count and size rollup for one extension.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtensionStats {
    pub count: usize,
    pub size_bytes: u64,
}

/// Recursive statistics for one managed directory.
#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub total_files: usize,
    pub total_folders: usize,
    pub total_size_bytes: u64,
    pub extensions: IndexMap<String, ExtensionStats>,
    /// Name of the most recently modified file; absent when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_file: Option<String>,
    /// Name of the least recently modified file; absent when empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_file: Option<String>,
}

/// Per-directory file statistics for the whole project.
#[derive(Debug, Clone, Serialize)]
pub struct FilesReport {
    pub report_date: DateTime<Utc>,
    pub project_directory: PathBuf,
    pub directories: IndexMap<String, DirectoryReport>,
}

/// Configuration block of the exported metadata document.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogConfiguration {
    pub project_directory: PathBuf,
    pub structure_created: bool,
    pub runtime_version: String,
    pub creation_timestamp: DateTime<Utc>,
}

/// Exported project metadata document.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectMetadata {
    pub files_report: FilesReport,
    pub configuration: CatalogConfiguration,
}

/// Manages the fixed `data/{input,result,logs}` layout under a project root.
pub struct FileCatalog {
    project_root: PathBuf,
}

impl FileCatalog {
    /// Open a catalog, eagerly creating the directory layout. Safe to call
    /// on an existing layout.
    pub fn new(project_root: impl Into<PathBuf>) -> Result<Self> {
        let project_root = project_root.into();
        for key in DirKey::ALL {
            let dir = Self::dir_path_in(&project_root, key);
            std::fs::create_dir_all(&dir).map_err(|e| DataPrepError::io(&dir, e))?;
        }
        info!("file catalog initialized at {}", project_root.display());
        Ok(Self { project_root })
    }

    /// The project root this catalog manages.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute path of one managed directory.
    pub fn dir_path(&self, key: DirKey) -> PathBuf {
        Self::dir_path_in(&self.project_root, key)
    }

    fn dir_path_in(root: &Path, key: DirKey) -> PathBuf {
        root.join("data").join(key.as_str())
    }

    /// List files in a managed directory, optionally filtered by extension
    /// (with or without the leading dot, case-insensitive). Non-recursive.
    pub fn list(&self, key: DirKey, extension: Option<&str>) -> Result<Vec<FileEntry>> {
        let dir = self.dir_path(key);
        let wanted = extension.map(|e| e.trim_start_matches('.').to_lowercase());

        let mut entries = Vec::new();
        let read = std::fs::read_dir(&dir).map_err(|e| DataPrepError::io(&dir, e))?;
        for entry in read {
            let entry = entry.map_err(|e| DataPrepError::io(&dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if let Some(ref wanted) = wanted {
                if &ext != wanted {
                    continue;
                }
            }
            let metadata = entry.metadata().map_err(|e| DataPrepError::io(&path, e))?;
            entries.push(FileEntry {
                extension: if ext.is_empty() {
                    String::new()
                } else {
                    format!(".{ext}")
                },
                size_bytes: metadata.len(),
                modified: metadata
                    .modified()
                    .map(DateTime::from)
                    .unwrap_or_else(|_| Utc::now()),
                path,
            });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));

        info!("found {} files in {}", entries.len(), key);
        Ok(entries)
    }

    /// Save a table into `data/result` and return the written path.
    ///
    /// The file name is `{name}_{YYYYMMDD_HHMMSS}.{ext}`, or `{name}.{ext}`
    /// when timestamping is disabled.
    pub fn save(
        &self,
        table: &Table,
        name: &str,
        timestamped: bool,
        format: SaveFormat,
    ) -> Result<PathBuf> {
        let file_name = if timestamped {
            let stamp = Local::now().format(FILE_TIMESTAMP);
            format!("{name}_{stamp}.{}", format.extension())
        } else {
            format!("{name}.{}", format.extension())
        };
        let path = self.dir_path(DirKey::Result).join(file_name);

        match format {
            SaveFormat::DelimitedText => write_csv(table, &path)?,
            SaveFormat::Structured => write_json(table, &path)?,
            SaveFormat::Spreadsheet => write_xlsx(table, &path)?,
        }

        info!(
            "table saved to {} ({} rows x {} columns, {:?})",
            path.display(),
            table.row_count(),
            table.column_count(),
            format
        );
        Ok(path)
    }

    /// Load a table from a file inside a managed directory.
    pub fn load(&self, file_name: &str, key: DirKey) -> Result<Table> {
        let path = self.dir_path(key).join(file_name);
        TableLoader::new().load(path)
    }

    /// Compress a managed directory into a timestamped zip archive placed
    /// in the project root. Returns the archive path.
    pub fn backup(&self, key: DirKey) -> Result<PathBuf> {
        let source = self.dir_path(key);
        let stamp = Local::now().format(FILE_TIMESTAMP);
        let archive_path = self
            .project_root
            .join(format!("backup_{key}_{stamp}.zip"));

        let file =
            File::create(&archive_path).map_err(|e| DataPrepError::io(&archive_path, e))?;
        let mut archive = zip::ZipWriter::new(file);
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut stack = vec![source.clone()];
        while let Some(dir) = stack.pop() {
            let read = std::fs::read_dir(&dir).map_err(|e| DataPrepError::io(&dir, e))?;
            for entry in read {
                let entry = entry.map_err(|e| DataPrepError::io(&dir, e))?;
                let path = entry.path();
                let relative = path
                    .strip_prefix(&source)
                    .map_err(|_| {
                        DataPrepError::InvalidArgument(format!(
                            "path {} escapes backup root",
                            path.display()
                        ))
                    })?
                    .to_string_lossy()
                    .replace('\\', "/");
                if path.is_dir() {
                    archive.add_directory(relative, options)?;
                    stack.push(path);
                } else {
                    archive.start_file(relative, options)?;
                    let bytes = std::fs::read(&path).map_err(|e| DataPrepError::io(&path, e))?;
                    archive
                        .write_all(&bytes)
                        .map_err(|e| DataPrepError::io(&archive_path, e))?;
                }
            }
        }
        archive.finish()?;

        info!("backup created: {}", archive_path.display());
        Ok(archive_path)
    }

    /// Group plain files of a managed directory into `YYYY-MM` subfolders
    /// keyed by creation time (modification time when the filesystem has no
    /// birth time). A file whose destination already exists is left in
    /// place. Returns the number of files moved.
    pub fn organize_by_month(&self, key: DirKey) -> Result<usize> {
        let dir = self.dir_path(key);
        let mut moved = 0;

        for entry in self.list(key, None)? {
            let metadata = entry
                .path
                .metadata()
                .map_err(|e| DataPrepError::io(&entry.path, e))?;
            let created = metadata.created().or_else(|_| metadata.modified());
            let created: DateTime<Local> = created
                .map(DateTime::from)
                .unwrap_or_else(|_| Local::now());

            let folder = dir.join(created.format("%Y-%m").to_string());
            std::fs::create_dir_all(&folder).map_err(|e| DataPrepError::io(&folder, e))?;

            let file_name = entry
                .path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            let destination = folder.join(&file_name);
            if destination.exists() {
                // Collision: the source stays where it is.
                debug!(
                    "skipping {}: destination already exists",
                    entry.path.display()
                );
                continue;
            }
            std::fs::rename(&entry.path, &destination)
                .map_err(|e| DataPrepError::io(&entry.path, e))?;
            moved += 1;
        }

        info!("files organized in {}: {} moved", key, moved);
        Ok(moved)
    }

    /// Build a per-directory statistics report for the whole layout.
    pub fn report(&self) -> Result<FilesReport> {
        let mut directories = IndexMap::new();
        for key in DirKey::ALL {
            directories.insert(key.as_str().to_string(), self.directory_report(key)?);
        }

        info!("files report generated");
        Ok(FilesReport {
            report_date: Utc::now(),
            project_directory: self.project_root.clone(),
            directories,
        })
    }

    fn directory_report(&self, key: DirKey) -> Result<DirectoryReport> {
        let root = self.dir_path(key);
        let mut files: Vec<(PathBuf, u64, DateTime<Utc>)> = Vec::new();
        let mut folders = 0usize;

        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            let read = std::fs::read_dir(&dir).map_err(|e| DataPrepError::io(&dir, e))?;
            for entry in read {
                let entry = entry.map_err(|e| DataPrepError::io(&dir, e))?;
                let path = entry.path();
                if path.is_dir() {
                    folders += 1;
                    stack.push(path);
                } else {
                    let metadata = entry.metadata().map_err(|e| DataPrepError::io(&path, e))?;
                    let modified = metadata
                        .modified()
                        .map(DateTime::from)
                        .unwrap_or_else(|_| Utc::now());
                    files.push((path, metadata.len(), modified));
                }
            }
        }

        let mut extensions: IndexMap<String, ExtensionStats> = IndexMap::new();
        let mut total_size = 0u64;
        for (path, size, _) in &files {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_else(|| "no_extension".to_string());
            let stats = extensions.entry(ext).or_default();
            stats.count += 1;
            stats.size_bytes += size;
            total_size += size;
        }

        let file_name = |entry: &(PathBuf, u64, DateTime<Utc>)| {
            entry.0.file_name().map(|n| n.to_string_lossy().into_owned())
        };
        let newest_file = files.iter().max_by_key(|f| f.2).and_then(file_name);
        let oldest_file = files.iter().min_by_key(|f| f.2).and_then(file_name);

        Ok(DirectoryReport {
            total_files: files.len(),
            total_folders: folders,
            total_size_bytes: total_size,
            extensions,
            newest_file,
            oldest_file,
        })
    }

    /// Write a JSON metadata document (files report plus a configuration
    /// block) into the project root and return its path.
    pub fn export_metadata(&self, name: &str) -> Result<PathBuf> {
        let metadata = ProjectMetadata {
            files_report: self.report()?,
            configuration: CatalogConfiguration {
                project_directory: self.project_root.clone(),
                structure_created: true,
                runtime_version: format!(
                    "{} {}",
                    env!("CARGO_PKG_NAME"),
                    env!("CARGO_PKG_VERSION")
                ),
                creation_timestamp: Utc::now(),
            },
        };

        let path = self.project_root.join(format!("{name}.json"));
        let file = File::create(&path).map_err(|e| DataPrepError::io(&path, e))?;
        serde_json::to_writer_pretty(file, &metadata)?;

        info!("metadata exported: {}", path.display());
        Ok(path)
    }

    /// Delete files in `result` and `logs` whose name starts with `prefix`
    /// and whose modification time is older than `days_old` days. Returns
    /// the number of files removed.
    pub fn clean_temporary_files(&self, prefix: &str, days_old: i64) -> Result<usize> {
        let cutoff = Utc::now() - chrono::Duration::days(days_old);
        let mut removed = 0;

        for key in [DirKey::Result, DirKey::Logs] {
            for entry in self.list(key, None)? {
                let name = entry
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if name.starts_with(prefix) && entry.modified < cutoff {
                    std::fs::remove_file(&entry.path)
                        .map_err(|e| DataPrepError::io(&entry.path, e))?;
                    debug!("deleted {}", entry.path.display());
                    removed += 1;
                }
            }
        }

        info!("cleanup completed: {} files deleted", removed);
        Ok(removed)
    }
}

/// Write a table as UTF-8 CSV.
fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(table.column_names())?;
    for index in 0..table.row_count() {
        let fields: Vec<String> = table.row(index).iter().map(|v| v.to_string()).collect();
        writer.write_record(&fields)?;
    }
    writer.flush().map_err(|e| DataPrepError::io(path, e))?;
    Ok(())
}

/// Write a table as a pretty-printed JSON array of records.
fn write_json(table: &Table, path: &Path) -> Result<()> {
    let records: Vec<serde_json::Map<String, serde_json::Value>> = (0..table.row_count())
        .map(|index| {
            table
                .columns()
                .iter()
                .map(|column| (column.name.clone(), value_to_json(&column.values[index])))
                .collect()
        })
        .collect();

    let file = File::create(path).map_err(|e| DataPrepError::io(path, e))?;
    serde_json::to_writer_pretty(file, &records)?;
    Ok(())
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        // Non-finite floats have no JSON representation and become null.
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Timestamp(_) | Value::Text(_) => serde_json::Value::String(value.to_string()),
    }
}

/// Write a table as an Excel workbook with a header row.
fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let spreadsheet_err = |e: rust_xlsxwriter::XlsxError| DataPrepError::Spreadsheet(e.to_string());

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (col, name) in table.column_names().iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *name)
            .map_err(spreadsheet_err)?;
    }
    for (col_index, column) in table.columns().iter().enumerate() {
        let col = col_index as u16;
        for (row_index, value) in column.values.iter().enumerate() {
            let row = row_index as u32 + 1;
            match value {
                Value::Null => {}
                Value::Int(i) => {
                    worksheet
                        .write_number(row, col, *i as f64)
                        .map_err(spreadsheet_err)?;
                }
                Value::Float(f) => {
                    worksheet
                        .write_number(row, col, *f)
                        .map_err(spreadsheet_err)?;
                }
                Value::Bool(b) => {
                    worksheet
                        .write_boolean(row, col, *b)
                        .map_err(spreadsheet_err)?;
                }
                Value::Text(_) | Value::Timestamp(_) => {
                    worksheet
                        .write_string(row, col, value.to_string())
                        .map_err(spreadsheet_err)?;
                }
            }
        }
    }

    workbook.save(path).map_err(spreadsheet_err)?;
    Ok(())
}
