//! Assembly of the per-Congress HTML document.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::audit::AuditedDataset;
use crate::config::CongressConfig;
use crate::error::{Result, SalError};
use crate::record::CanonicalRecord;

use super::formatters::{FormatterTable, escape};

/// Rendered HTML for one Congress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub html: String,
    /// One per record.
    pub fragment_count: usize,
    pub session_count: usize,
}

impl GeneratedDocument {
    /// Write to `path`. An existing file is only replaced when `overwrite`
    /// is set.
    pub fn write(&self, path: impl AsRef<Path>, overwrite: bool) -> Result<()> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Err(SalError::Validation(format!(
                "output '{}' already exists; delete or back it up to regenerate",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| SalError::io(parent, e))?;
            }
        }
        fs::write(path, &self.html).map_err(|e| SalError::io(path, e))?;
        info!(
            fragments = self.fragment_count,
            sessions = self.session_count,
            "wrote {}",
            path.display()
        );
        Ok(())
    }
}

/// Renders audited records into the published table markup.
#[derive(Debug, Clone)]
pub struct Generator<'a> {
    config: &'a CongressConfig,
    formatters: FormatterTable,
}

impl<'a> Generator<'a> {
    /// Generator with the built-in formatter table.
    pub fn new(config: &'a CongressConfig) -> Self {
        Self::with_formatters(config, FormatterTable::default())
    }

    pub fn with_formatters(config: &'a CongressConfig, formatters: FormatterTable) -> Self {
        Self { config, formatters }
    }

    /// Generator using the formatter table named in the configuration, or
    /// the built-in one when none is configured.
    pub fn from_config(config: &'a CongressConfig) -> Result<Self> {
        let formatters = match config.generator_map_path() {
            Some(path) => FormatterTable::load(path)?,
            None => FormatterTable::default(),
        };
        Ok(Self::with_formatters(config, formatters))
    }

    pub fn formatters(&self) -> &FormatterTable {
        &self.formatters
    }

    /// Render an audited dataset.
    pub fn generate_dataset(&self, dataset: &AuditedDataset) -> Result<GeneratedDocument> {
        self.generate(&dataset.records)
    }

    /// Render `records` in order, grouped into one table per session.
    pub fn generate(&self, records: &[CanonicalRecord]) -> Result<GeneratedDocument> {
        let config = self.config;
        let mut html = String::new();

        html.push_str("<!-- Begin HTML-->\n");
        let _ = writeln!(
            html,
            r#"<a name="{}" id="{}"></a>"#,
            config.start_date.format("%Y-%m-%d"),
            config.end_date.format("%Y-%m-%d")
        );
        let _ = writeln!(
            html,
            r#"<h3 class="js-expandmore" data-hideshow-prefix-class="light">{} ({}-{})</h3>"#,
            escape(&config.congress),
            config.start_date.format("%Y"),
            config.end_date.format("%Y")
        );
        html.push_str("<div class=\"js-to_expand\">\n");

        let mut current_session: Option<u32> = None;
        let mut session_count = 0;
        for record in records {
            if current_session != Some(record.session) {
                if current_session.is_some() {
                    close_table(&mut html);
                }
                let _ = writeln!(html, "    <h4>{}</h4>", record.session_heading()?);
                html.push_str(
                    "    <table class=\"table-bordered table-padded table-full-width\">\n",
                );
                html.push_str("        <tbody>\n");
                current_session = Some(record.session);
                session_count += 1;
            }
            html.push_str(&self.render_record(record)?);
        }
        if current_session.is_some() {
            close_table(&mut html);
        }
        html.push_str("</div>\n");

        debug!(
            records = records.len(),
            sessions = session_count,
            bytes = html.len(),
            "generated document"
        );

        Ok(GeneratedDocument {
            html,
            fragment_count: records.len(),
            session_count,
        })
    }

    /// Render the table row(s) for one record.
    pub fn render_record(&self, record: &CanonicalRecord) -> Result<String> {
        let pdf_start_page = match record.pdf_start_page {
            Some(page) if record.audited => page,
            _ => return Err(SalError::NotAudited { row: record.row }),
        };
        let kind = self.formatters.get(record.statute_type).ok_or_else(|| {
            SalError::UnreachableState {
                statute_type: record.statute_type.to_string(),
                row: record.row,
            }
        })?;
        kind.render(
            record,
            &self.pdf_link(record, pdf_start_page),
            &self.config.date_format,
        )
    }

    /// Link into the PDF that holds `record`.
    pub fn pdf_link(&self, record: &CanonicalRecord, pdf_start_page: u32) -> String {
        let base = if record.is_private() {
            &self.config.private_pdf_url
        } else {
            &self.config.public_pdf_url
        };
        format!("{}#page={}", base, pdf_start_page)
    }
}

fn close_table(html: &mut String) {
    html.push_str("        </tbody>\n");
    html.push_str("    </table>\n");
}
