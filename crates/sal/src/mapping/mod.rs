//! Mapping tables for raw headers and statute-type labels.
//!
//! Both tables are flat YAML documents mapping a raw string, as found in the
//! worksheets, to a canonical name:
//!
//! ```yaml
//! # header-map.yaml
//! "Sess.": session
//! "Number/Chapter": chapter_or_number
//!
//! # statute-map.yaml
//! "Pub.Res.": resolution
//! "Law": law
//! ```
//!
//! Keys are matched after [`normalize_key`]; there is no fuzzy matching.
//! A worksheet value that misses the table is an error, and the fix is to
//! extend the table.

mod header;
mod statute;

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Result, SalError};

pub use header::{CanonicalField, HeaderNormalizer};
pub use statute::{LAW_SLUG, StatuteType, StatuteTypeNormalizer, Visibility};

/// Case-fold, trim, and collapse internal whitespace.
pub fn normalize_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// The two lookup tables the normalizers are built from.
#[derive(Debug, Clone)]
pub struct MappingTables {
    pub headers: HeaderNormalizer,
    pub statute_types: StatuteTypeNormalizer,
}

impl MappingTables {
    /// Build from YAML documents.
    pub fn from_yaml(header_yaml: &str, statute_yaml: &str) -> Result<Self> {
        let header_entries = parse_table(header_yaml)?;
        let statute_entries = parse_table(statute_yaml)?;

        let headers = HeaderNormalizer::from_table(
            header_entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;
        let statute_types = StatuteTypeNormalizer::from_table(
            statute_entries
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        )?;

        debug!(
            headers = header_entries.len(),
            statute_types = statute_entries.len(),
            "loaded mapping tables"
        );

        Ok(Self {
            headers,
            statute_types,
        })
    }

    /// Load the header and statute-type tables from YAML files.
    pub fn load(header_path: impl AsRef<Path>, statute_path: impl AsRef<Path>) -> Result<Self> {
        let header_yaml = read_to_string(header_path.as_ref())?;
        let statute_yaml = read_to_string(statute_path.as_ref())?;
        Self::from_yaml(&header_yaml, &statute_yaml)
    }
}

/// Parse a flat string → string YAML table. An empty document is an empty table.
pub(crate) fn parse_table(yaml: &str) -> Result<IndexMap<String, String>> {
    let blank = yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    });
    if blank {
        return Ok(IndexMap::new());
    }
    let table: Option<IndexMap<String, String>> = serde_yaml::from_str(yaml)?;
    Ok(table.unwrap_or_default())
}

pub(crate) fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SalError::io(path, e))
}
