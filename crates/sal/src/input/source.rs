//! Raw worksheet data and source metadata.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Metadata about the exported worksheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// Number of data rows (excluding header and skipped rows).
    pub row_count: usize,
    /// Number of columns.
    pub column_count: usize,
    /// When the file was read.
    pub read_at: DateTime<Utc>,
}

impl SourceMetadata {
    /// Create metadata for a file that has been read.
    pub fn new(
        path: PathBuf,
        hash: String,
        size_bytes: u64,
        format: String,
        row_count: usize,
        column_count: usize,
    ) -> Self {
        let file = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            file,
            path,
            hash,
            size_bytes,
            format,
            row_count,
            column_count,
            read_at: Utc::now(),
        }
    }

    /// Dataset identifier derived from the file stem.
    pub fn dataset_id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.clone())
    }
}

/// One worksheet row keyed by its raw header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// Spreadsheet row number (1-based, header is row 1).
    pub row: usize,
    /// Cell values in column order.
    pub cells: IndexMap<String, String>,
}

impl RawRecord {
    /// Get a cell by raw header.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(|s| s.as_str())
    }

    /// Whether every cell is blank or a null marker.
    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|v| DataTable::is_null_value(v))
    }
}

/// Parsed worksheet data.
#[derive(Debug, Clone)]
pub struct DataTable {
    /// Column headers as written in the worksheet.
    pub headers: Vec<String>,
    /// Row data as strings (row-major order).
    pub rows: Vec<Vec<String>>,
    /// Spreadsheet row number of the first data row.
    pub first_row: usize,
}

impl DataTable {
    /// Create a new data table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, first_row: usize) -> Self {
        Self {
            headers,
            rows,
            first_row,
        }
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Iterate rows as [`RawRecord`]s carrying their spreadsheet row number.
    pub fn records(&self) -> impl Iterator<Item = RawRecord> + '_ {
        self.rows.iter().enumerate().map(move |(index, row)| {
            let cells = self
                .headers
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect();
            RawRecord {
                row: self.first_row + index,
                cells,
            }
        })
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
    }
}
