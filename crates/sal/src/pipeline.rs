//! Wiring of the phases for one Congress: load, normalize, audit, generate.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audit::{
    AuditEngine, AuditOutcome, AuditSession, AuditStatus, AuditedDataset, CheckpointStore,
    FileCheckpointStore, Responder,
};
use crate::config::CongressConfig;
use crate::error::Result;
use crate::generate::{GeneratedDocument, Generator};
use crate::input::{Parser, ParserConfig, SourceMetadata};
use crate::mapping::MappingTables;
use crate::normalize::Normalizer;
use crate::record::CanonicalRecord;

/// What remains to be done for a Congress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Records still need review.
    Audit,
    /// The audited dataset exists; the document does not.
    Generate,
    /// The document has been written.
    Done,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Audit => "Audit",
            Phase::Generate => "Generate",
            Phase::Done => "Done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized records of a worksheet with the metadata of their source.
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub dataset: String,
    pub source: SourceMetadata,
    pub records: Vec<CanonicalRecord>,
}

/// The configured pipeline for one Congress.
pub struct Pipeline {
    config: CongressConfig,
    tables: MappingTables,
    parser: Parser,
}

impl Pipeline {
    pub fn new(config: CongressConfig, tables: MappingTables) -> Self {
        let parser = Parser::with_config(
            ParserConfig::default()
                .with_start_row(config.start_row)
                .with_delimiter(config.delimiter_byte()),
        );
        Self {
            config,
            tables,
            parser,
        }
    }

    /// Load the mapping tables named by `config`.
    pub fn from_config(config: CongressConfig) -> Result<Self> {
        let tables = MappingTables::load(config.header_map_path(), config.statute_map_path())?;
        Ok(Self::new(config, tables))
    }

    /// Load the configuration file and everything it refers to.
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        Self::from_config(CongressConfig::load(config_path)?)
    }

    pub fn config(&self) -> &CongressConfig {
        &self.config
    }

    pub fn tables(&self) -> &MappingTables {
        &self.tables
    }

    pub fn dataset_id(&self) -> String {
        self.config.dataset_id()
    }

    /// The next phase, decided by which artifacts exist on disk.
    pub fn phase(&self) -> Phase {
        if !self.config.audited_path().is_file() {
            Phase::Audit
        } else if self.config.output_path().exists() {
            Phase::Done
        } else {
            Phase::Generate
        }
    }

    /// Parse and normalize the input worksheet.
    pub fn prepare(&self) -> Result<PreparedDataset> {
        let input = self.config.input_path();
        info!(input = %input.display(), "reading worksheet");

        let (table, source) = self.parser.parse_file(&input)?;
        let records = Normalizer::new(&self.tables, &self.config).normalize_table(&table)?;

        Ok(PreparedDataset {
            dataset: self.dataset_id(),
            source,
            records,
        })
    }

    /// Audit engine over the work directory, using the configured policy.
    pub fn audit_engine(&self) -> AuditEngine<FileCheckpointStore> {
        AuditEngine::with_policy_kind(
            FileCheckpointStore::new(self.config.work_path()),
            self.config.offset_policy,
        )
    }

    pub fn audit_status(&self) -> Result<AuditStatus> {
        self.audit_engine().status(&self.dataset_id())
    }

    /// Persist a completed audit where the generate phase looks for it.
    pub fn save_audited(&self, dataset: &AuditedDataset) -> Result<()> {
        let path = self.config.audited_path();
        dataset.save(&path)?;
        info!(records = dataset.len(), "saved audited dataset {}", path.display());
        Ok(())
    }

    /// Drive `session` with `responder`. A completed audit is saved where
    /// the generate phase looks for it before its checkpoint is archived.
    pub fn run_audit_session<S, R>(
        &self,
        session: AuditSession<'_, S>,
        responder: &mut R,
    ) -> Result<AuditOutcome>
    where
        S: CheckpointStore,
        R: Responder + ?Sized,
    {
        session.run_with(responder, |dataset| self.save_audited(dataset))
    }

    pub fn load_audited(&self) -> Result<AuditedDataset> {
        AuditedDataset::load(self.config.audited_path())
    }

    /// Render the audited dataset.
    pub fn generate(&self) -> Result<GeneratedDocument> {
        let dataset = self.load_audited()?;
        if dataset.dataset != self.dataset_id() {
            warn!(
                expected = %self.dataset_id(),
                found = %dataset.dataset,
                "audited dataset was produced for a different input"
            );
        }
        Generator::from_config(&self.config)?.generate_dataset(&dataset)
    }

    /// Render and write the output document.
    pub fn generate_to_file(&self, overwrite: bool) -> Result<GeneratedDocument> {
        let document = self.generate()?;
        document.write(self.config.output_path(), overwrite)?;
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pipeline(dir: &Path) -> Pipeline {
        let yaml = r#"
congress: 1st Congress
input_file: LoC_1.csv
public_pdf_url: https://example.org/public.pdf
private_pdf_url: https://example.org/private.pdf
start_date: 1789-03-04
end_date: 1791-03-03
output_file: congress-1.html
html_dir: html
"#;
        let mut config = CongressConfig::from_yaml(yaml).unwrap();
        config.base_dir = dir.to_path_buf();
        let tables = MappingTables::from_yaml("", "").unwrap();
        Pipeline::new(config, tables)
    }

    #[test]
    fn test_phase_follows_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        assert_eq!(pipeline.phase(), Phase::Audit);

        fs::create_dir_all(dir.path().join("tmp")).unwrap();
        fs::write(pipeline.config().audited_path(), "{}").unwrap();
        assert_eq!(pipeline.phase(), Phase::Generate);

        fs::create_dir_all(dir.path().join("html")).unwrap();
        fs::write(pipeline.config().output_path(), "").unwrap();
        assert_eq!(pipeline.phase(), Phase::Done);
    }

    #[test]
    fn test_audit_status_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(dir.path());
        assert_eq!(pipeline.audit_status().unwrap(), AuditStatus::NotStarted);
        assert_eq!(pipeline.dataset_id(), "LoC_1");
    }
}
