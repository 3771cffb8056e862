//! The audited dataset handed from the audit phase to generation.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalError};
use crate::record::CanonicalRecord;

use super::checkpoint::{CHECKPOINT_VERSION, Checkpoint, write_json_atomic};
use super::decision::{AuditDecision, DecisionStatus};

/// A dataset whose every record has a confirmed PDF start page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditedDataset {
    pub version: u32,
    pub dataset: String,
    pub source_hash: String,
    pub completed_at: DateTime<Utc>,
    pub records: Vec<CanonicalRecord>,
    #[serde(default)]
    pub decisions: Vec<AuditDecision>,
}

impl AuditedDataset {
    /// Build from a completed checkpoint.
    pub fn from_checkpoint(checkpoint: &Checkpoint) -> Result<Self> {
        let dataset = Self {
            version: CHECKPOINT_VERSION,
            dataset: checkpoint.dataset.clone(),
            source_hash: checkpoint.source_hash.clone(),
            completed_at: Utc::now(),
            records: checkpoint.records.clone(),
            decisions: checkpoint.decisions.clone(),
        };
        dataset.verify()?;
        Ok(dataset)
    }

    /// Every record is audited and has a PDF start page.
    pub fn verify(&self) -> Result<()> {
        if self.records.is_empty() {
            return Err(SalError::EmptyData(format!(
                "audited dataset '{}' has no records",
                self.dataset
            )));
        }
        match self
            .records
            .iter()
            .find(|r| !r.audited || r.pdf_start_page.is_none())
        {
            Some(r) => Err(SalError::NotAudited { row: r.row }),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records whose computed page was replaced.
    pub fn override_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.status == DecisionStatus::Overridden)
            .count()
    }

    /// Save to a JSON file, creating the parent directory if needed. An
    /// existing file is replaced only once the new one is fully written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    SalError::Persistence(format!(
                        "Failed to create directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        write_json_atomic(path, self)
    }

    /// Load and verify a JSON file written by [`AuditedDataset::save`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            SalError::Persistence(format!(
                "Failed to open file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let dataset: AuditedDataset =
            serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                SalError::Persistence(format!(
                    "Failed to parse audited dataset '{}': {}",
                    path.display(),
                    e
                ))
            })?;

        dataset.verify()?;
        Ok(dataset)
    }
}
