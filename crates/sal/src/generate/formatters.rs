//! Per-category table rows.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalError};
use crate::mapping::{StatuteType, Visibility, normalize_key, parse_table, read_to_string};
use crate::record::CanonicalRecord;

const ROW_INDENT: &str = "            ";
const CELL_INDENT: &str = "                ";

/// Row layouts of the published tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatterKind {
    /// Chapter link, Public/Private, title, date.
    Law,
    /// Category link, Public/Private, Roman-numbered title, date.
    Numbered,
    /// Category link, title, date.
    Generic,
    /// Category link and title only.
    Undated,
    /// A blank spacer row, then an undated row.
    SpecialPage,
    /// Link cell only.
    Empty,
}

impl FormatterKind {
    pub const ALL: [FormatterKind; 6] = [
        FormatterKind::Law,
        FormatterKind::Numbered,
        FormatterKind::Generic,
        FormatterKind::Undated,
        FormatterKind::SpecialPage,
        FormatterKind::Empty,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FormatterKind::Law => "law",
            FormatterKind::Numbered => "numbered",
            FormatterKind::Generic => "generic",
            FormatterKind::Undated => "undated",
            FormatterKind::SpecialPage => "special-page",
            FormatterKind::Empty => "empty",
        }
    }

    /// Parse a formatter name. Generator function names such as
    /// `html_for_law` are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_key(name);
        let kind = match key.as_str() {
            "law" | "html_for_law" => FormatterKind::Law,
            "numbered" | "html_for_act_resolution_appendix" => FormatterKind::Numbered,
            "generic" | "generic_html_generator" => FormatterKind::Generic,
            "undated" | "html_for_articles_ordinance" => FormatterKind::Undated,
            "special-page" | "html_for_special_pages" => FormatterKind::SpecialPage,
            "empty" | "html_with_empty_cells" => FormatterKind::Empty,
            _ => return None,
        };
        Some(kind)
    }

    /// Render the table row(s) for `record`, linking to `link`.
    pub fn render(&self, record: &CanonicalRecord, link: &str, date_format: &str) -> Result<String> {
        let label = escape(&record.label);
        let anchor = format!(
            r#"<a target="_blank" href="{}">{}</a>"#,
            escape(link),
            label
        );

        let html = match self {
            FormatterKind::Law => row(&[
                format!(
                    r#"<a target="_blank" href="{}">{}</a>"#,
                    escape(link),
                    escape(record.chapter_or_number.trim())
                ),
                escape(visibility(record)),
                escape(&record.title),
                date(record, date_format)?,
            ]),
            FormatterKind::Numbered => row(&[
                anchor,
                escape(record.public_private.map(|v| v.label()).unwrap_or("")),
                escape(&record.numbered_title()?),
                date(record, date_format)?,
            ]),
            FormatterKind::Generic => row(&[
                anchor,
                String::new(),
                escape(&record.title),
                date(record, date_format)?,
            ]),
            FormatterKind::Undated => undated_row(anchor, record),
            FormatterKind::SpecialPage => {
                let spacer = row(&vec!["&nbsp;".to_string(); 4]);
                format!("{}{}", spacer, undated_row(anchor, record))
            }
            FormatterKind::Empty => {
                let mut out = format!("{}<tr>\n", ROW_INDENT);
                let _ = writeln!(out, r#"{}<td type="empty">{}</td>"#, CELL_INDENT, anchor);
                for _ in 0..3 {
                    let _ = writeln!(out, "{}<td></td>", CELL_INDENT);
                }
                let _ = writeln!(out, "{}</tr>", ROW_INDENT);
                out
            }
        };
        Ok(html)
    }
}

fn undated_row(anchor: String, record: &CanonicalRecord) -> String {
    row(&[anchor, String::new(), escape(&record.title), String::new()])
}

fn row(cells: &[String]) -> String {
    let mut out = format!("{}<tr>\n", ROW_INDENT);
    for cell in cells {
        let _ = writeln!(out, "{}<td>{}</td>", CELL_INDENT, cell);
    }
    let _ = writeln!(out, "{}</tr>", ROW_INDENT);
    out
}

fn visibility(record: &CanonicalRecord) -> &'static str {
    match record.statute_type {
        StatuteType::PrivateLaw => Visibility::Private.label(),
        StatuteType::PublicLaw => Visibility::Public.label(),
        _ => record.public_private.map(|v| v.label()).unwrap_or(""),
    }
}

fn date(record: &CanonicalRecord, date_format: &str) -> Result<String> {
    match record.date {
        Some(d) => format_date(d, date_format),
        None => Ok(String::new()),
    }
}

/// Format `date` with a strftime pattern, rejecting invalid patterns.
pub fn format_date(date: NaiveDate, pattern: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern))
        .map_err(|_| SalError::Config(format!("invalid date format '{}'", pattern)))?;
    Ok(out)
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Which formatter renders each statute type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterTable {
    entries: BTreeMap<StatuteType, FormatterKind>,
}

impl Default for FormatterTable {
    fn default() -> Self {
        let entries = StatuteType::ALL
            .into_iter()
            .map(|t| {
                let kind = match t {
                    StatuteType::PublicLaw | StatuteType::PrivateLaw => FormatterKind::Law,
                    StatuteType::Resolution | StatuteType::Act | StatuteType::Appendix => {
                        FormatterKind::Numbered
                    }
                    StatuteType::Proclamation | StatuteType::Treaty => FormatterKind::Generic,
                    StatuteType::Articles | StatuteType::Ordinance => FormatterKind::Undated,
                    StatuteType::SpecialPage => FormatterKind::SpecialPage,
                };
                (t, kind)
            })
            .collect();
        Self { entries }
    }
}

impl FormatterTable {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Parse a `statute type: formatter` YAML table. Only the listed types
    /// get a formatter.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut table = Self::empty();
        for (statute, formatter) in parse_table(yaml)? {
            let statute_type = StatuteType::from_slug(&statute).ok_or_else(|| {
                SalError::Config(format!(
                    "formatter table: unknown statute type '{}'",
                    statute
                ))
            })?;
            let kind = FormatterKind::from_name(&formatter).ok_or_else(|| {
                SalError::Config(format!(
                    "formatter table: unknown formatter '{}' for '{}'",
                    formatter, statute
                ))
            })?;
            table.insert(statute_type, kind);
        }
        Ok(table)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_yaml(&read_to_string(path.as_ref())?)
    }

    pub fn insert(&mut self, statute_type: StatuteType, kind: FormatterKind) {
        self.entries.insert(statute_type, kind);
    }

    pub fn remove(&mut self, statute_type: StatuteType) -> Option<FormatterKind> {
        self.entries.remove(&statute_type)
    }

    pub fn get(&self, statute_type: StatuteType) -> Option<FormatterKind> {
        self.entries.get(&statute_type).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
