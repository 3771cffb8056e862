//! CSV/TSV worksheet parser with delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::source::{DataTable, SourceMetadata};
use crate::error::{Result, SalError};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Spreadsheet row number of the first data row. Row 1 is the header;
    /// rows between the header and `start_row` are skipped.
    pub start_row: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            start_row: 2,
        }
    }
}

impl ParserConfig {
    /// Set the first data row.
    pub fn with_start_row(mut self, start_row: usize) -> Self {
        self.start_row = start_row;
        self
    }

    /// Force a delimiter instead of detecting one.
    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Parses exported worksheets.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| SalError::io(path, e))?;
        let size_bytes = file.metadata().map_err(|e| SalError::io(path, e))?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| SalError::io(path, e))?;

        let hash = fingerprint(&contents);

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let data_table = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        debug!(
            path = %path.display(),
            rows = data_table.row_count(),
            columns = data_table.column_count(),
            format = %format,
            "parsed worksheet"
        );

        let source_metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            data_table.row_count(),
            data_table.column_count(),
        );

        Ok((data_table, source_metadata))
    }

    /// Parse in-memory worksheet bytes with a known delimiter.
    pub fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();

        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(SalError::EmptyData("No columns found".to_string()));
        }

        let start_row = self.config.start_row.max(2);
        let skip = start_row - 2;
        let expected_cols = headers.len();

        let mut rows = Vec::new();
        for result in reader.records().skip(skip) {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Pad row if needed
            while row.len() < expected_cols {
                row.push(String::new());
            }
            row.truncate(expected_cols);

            rows.push(row);
        }

        if rows.is_empty() {
            return Err(SalError::EmptyData("No data rows found".to_string()));
        }

        Ok(DataTable::new(headers, rows, start_row))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// SHA-256 fingerprint of worksheet bytes, used to bind checkpoints to input.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{:x}", hasher.finalize())
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(SalError::EmptyData("No lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Tab gets a slight bonus: it rarely appears inside titles.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter_csv() {
        let data = b"a,b,c\n1,2,3\n4,5,6";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_delimiter_tsv() {
        let data = b"a\tb\tc\n1\t2\t3\n4\t5\t6";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_detect_ignores_quoted_commas() {
        let data = b"Title\tDate\n\"An Act, to establish\"\t1789-09-24\n";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_parse_csv() {
        let parser = Parser::new();
        let data = b"Sess.,Type,Title\n1,Law,An Act\n1,Resolution,A Resolution";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.headers, vec!["Sess.", "Type", "Title"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.first_row, 2);
        assert_eq!(table.get(1, 1), Some("Resolution"));
    }

    #[test]
    fn test_start_row_skips_rows_after_header() {
        let parser = Parser::with_config(ParserConfig::default().with_start_row(4));
        let data = b"a,b\nnote,x\nnote,y\n1,2\n3,4\n";
        let table = parser.parse_bytes(data, b',').unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.first_row, 4);
        assert_eq!(table.get(0, 0), Some("1"));
    }

    #[test]
    fn test_configured_delimiter_overrides_detection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("LoC_1.csv");
        // One comma and one pipe per line: detection settles on the comma
        std::fs::write(&path, "Title, short|Date\nAn Act, to wit|1789-09-24\n").unwrap();
        assert_eq!(detect_delimiter(&std::fs::read(&path).unwrap()).unwrap(), b',');

        let parser = Parser::with_config(ParserConfig::default().with_delimiter(Some(b'|')));
        let (table, source) = parser.parse_file(&path).unwrap();
        assert_eq!(table.headers, vec!["Title, short", "Date"]);
        assert_eq!(table.get(0, 0), Some("An Act, to wit"));
        assert_eq!(source.format, "psv");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let parser = Parser::new();
        let table = parser.parse_bytes(b"a,b,c\n1\n", b',').unwrap();
        assert_eq!(table.rows[0], vec!["1", "", ""]);
    }

    #[test]
    fn test_no_rows_is_empty_data() {
        let parser = Parser::new();
        let err = parser.parse_bytes(b"a,b\n", b',').unwrap_err();
        assert!(matches!(err, SalError::EmptyData(_)));
    }

    #[test]
    fn test_fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
        assert!(fingerprint(b"").starts_with("sha256:"));
    }
}
