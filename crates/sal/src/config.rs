//! Per-Congress configuration.
//!
//! Loaded once from `user-config.yaml` and passed by reference to the
//! components that need it. Keys from the legacy upper-case format
//! (`CONGRESS`, `EXCEL_FILE`, `TMP_DIR`, ...) are accepted as aliases.
//!
//! ```yaml
//! congress: 1st Congress
//! input_file: LoC_1.csv
//! start_row: 2
//! public_pdf_url: https://example.org/llsl-c1.pdf
//! private_pdf_url: https://example.org/llsl-c1-private.pdf
//! start_date: 1789-03-04
//! end_date: 1791-03-03
//! output_file: congress-1.html
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audit::OffsetPolicyKind;
use crate::error::{Result, SalError};
use crate::generate::format_date;
use crate::mapping::read_to_string;

/// Configuration for one Congress's dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressConfig {
    /// Display name, e.g. "1st Congress".
    #[serde(alias = "CONGRESS")]
    pub congress: String,

    /// Exported worksheet (CSV/TSV), relative to `input_dir`.
    #[serde(alias = "EXCEL_FILE")]
    pub input_file: String,

    /// Spreadsheet row number of the first data row.
    #[serde(alias = "START_ROW", default = "default_start_row")]
    pub start_row: usize,

    /// Worksheet delimiter; detected from the file when unset.
    #[serde(default)]
    pub delimiter: Option<char>,

    /// Base URL of the public-law PDF.
    #[serde(alias = "PUBLIC_PDF_URL")]
    pub public_pdf_url: String,

    /// Base URL of the private-law PDF.
    #[serde(alias = "PRIVATE_PDF_URL")]
    pub private_pdf_url: String,

    /// First day of the Congress.
    #[serde(alias = "CONGRESS_START_DATE")]
    pub start_date: NaiveDate,

    /// Last day of the Congress.
    #[serde(alias = "CONGRESS_END_DATE")]
    pub end_date: NaiveDate,

    /// Generated HTML file name, relative to `html_dir`.
    #[serde(alias = "OUTPUT_FILE")]
    pub output_file: String,

    #[serde(alias = "EXCEL_DIR", default = "default_dir")]
    pub input_dir: PathBuf,

    #[serde(alias = "HTML_DIR", default = "default_dir")]
    pub html_dir: PathBuf,

    /// Checkpoints and audited datasets.
    #[serde(alias = "TMP_DIR", default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Prefix for the audited dataset file.
    #[serde(alias = "AUDITED_PREFIX", default = "default_audited_prefix")]
    pub audited_prefix: String,

    /// Rule for the expected PDF start page of each record.
    #[serde(default)]
    pub offset_policy: OffsetPolicyKind,

    /// strftime pattern for dates in the generated document.
    #[serde(default = "default_date_format")]
    pub date_format: String,

    #[serde(default)]
    pub maps: MapsConfig,

    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Locations of the mapping tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    #[serde(default = "default_header_map")]
    pub header_map: PathBuf,
    #[serde(default = "default_statute_map")]
    pub statute_map: PathBuf,
    /// Optional statute type → formatter override.
    #[serde(default)]
    pub generator_map: Option<PathBuf>,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            header_map: default_header_map(),
            statute_map: default_statute_map(),
            generator_map: None,
        }
    }
}

fn default_start_row() -> usize {
    2
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_audited_prefix() -> String {
    "audited-".to_string()
}

fn default_date_format() -> String {
    "%B %-d, %Y".to_string()
}

fn default_header_map() -> PathBuf {
    PathBuf::from("maps/header-map.yaml")
}

fn default_statute_map() -> PathBuf {
    PathBuf::from("maps/statute-map.yaml")
}

impl CongressConfig {
    /// Parse and validate a YAML document. Relative paths resolve against the
    /// current directory.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: CongressConfig = serde_yaml::from_str(yaml)?;
        config.base_dir = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    /// Load from a file. Relative paths resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = read_to_string(path)?;
        let mut config = Self::from_yaml(&yaml)?;
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        debug!(
            congress = %config.congress,
            input = %config.input_file,
            "loaded configuration from {}",
            path.display()
        );
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.congress.trim().is_empty() {
            return Err(SalError::Config("congress name is empty".to_string()));
        }
        if self.input_file.trim().is_empty() {
            return Err(SalError::Config("input_file is empty".to_string()));
        }
        if self.output_file.trim().is_empty() {
            return Err(SalError::Config("output_file is empty".to_string()));
        }
        if self.start_row < 2 {
            return Err(SalError::Config(format!(
                "start_row must be at least 2 (row 1 is the header), got {}",
                self.start_row
            )));
        }
        if self.start_date > self.end_date {
            return Err(SalError::Config(format!(
                "start_date {} is after end_date {}",
                self.start_date, self.end_date
            )));
        }
        if self.public_pdf_url.trim().is_empty() || self.private_pdf_url.trim().is_empty() {
            return Err(SalError::Config("PDF URLs must not be empty".to_string()));
        }
        if let Some(c) = self.delimiter {
            if !c.is_ascii() || c.is_ascii_alphanumeric() || c == '"' || c == '\n' {
                return Err(SalError::Config(format!(
                    "delimiter {:?} is not a usable single-byte separator",
                    c
                )));
            }
        }
        format_date(self.start_date, &self.date_format)?;
        Ok(())
    }

    /// Configured delimiter as a byte. `validate` guarantees it is ASCII.
    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.and_then(|c| u8::try_from(c).ok())
    }

    /// Whether `date` falls within the Congress.
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Dataset identifier: the input file stem.
    pub fn dataset_id(&self) -> String {
        Path::new(&self.input_file)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input_file.clone())
    }

    pub fn input_path(&self) -> PathBuf {
        self.resolve(&self.input_dir).join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.resolve(&self.html_dir).join(&self.output_file)
    }

    pub fn work_path(&self) -> PathBuf {
        self.resolve(&self.work_dir)
    }

    /// Where the completed, audited dataset is written.
    pub fn audited_path(&self) -> PathBuf {
        self.work_path()
            .join(format!("{}{}.json", self.audited_prefix, self.dataset_id()))
    }

    pub fn header_map_path(&self) -> PathBuf {
        self.resolve(&self.maps.header_map)
    }

    pub fn statute_map_path(&self) -> PathBuf {
        self.resolve(&self.maps.statute_map)
    }

    pub fn generator_map_path(&self) -> Option<PathBuf> {
        self.maps.generator_map.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}
