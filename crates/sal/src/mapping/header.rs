//! Header normalization onto the canonical field set.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::normalize_key;
use crate::error::{Result, SalError};

/// Canonical record fields a worksheet column can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Session,
    StatuteType,
    ChapterOrNumber,
    Title,
    PublicPrivate,
    Volume,
    StartPage,
    EndPage,
    Date,
    PdfStartPage,
    /// Column deliberately dropped by the mapping table.
    Ignore,
}

impl CanonicalField {
    /// All fields, in canonical column order.
    pub const ALL: [CanonicalField; 11] = [
        CanonicalField::Session,
        CanonicalField::StatuteType,
        CanonicalField::ChapterOrNumber,
        CanonicalField::Title,
        CanonicalField::PublicPrivate,
        CanonicalField::Volume,
        CanonicalField::StartPage,
        CanonicalField::EndPage,
        CanonicalField::Date,
        CanonicalField::PdfStartPage,
        CanonicalField::Ignore,
    ];

    /// Canonical field name.
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Session => "session",
            CanonicalField::StatuteType => "statute_type",
            CanonicalField::ChapterOrNumber => "chapter_or_number",
            CanonicalField::Title => "title",
            CanonicalField::PublicPrivate => "public_private",
            CanonicalField::Volume => "volume",
            CanonicalField::StartPage => "start_page",
            CanonicalField::EndPage => "end_page",
            CanonicalField::Date => "date",
            CanonicalField::PdfStartPage => "pdf_start_page",
            CanonicalField::Ignore => "ignore",
        }
    }

    /// Look up a field by its canonical name.
    pub fn from_name(name: &str) -> Option<Self> {
        let key = normalize_key(name);
        Self::ALL.into_iter().find(|f| f.name() == key)
    }

    /// Whether every worksheet must provide this column.
    pub fn is_required(&self) -> bool {
        matches!(
            self,
            CanonicalField::Session
                | CanonicalField::StatuteType
                | CanonicalField::ChapterOrNumber
                | CanonicalField::Title
                | CanonicalField::Volume
                | CanonicalField::StartPage
                | CanonicalField::EndPage
                | CanonicalField::Date
        )
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps raw column headers to canonical fields.
#[derive(Debug, Clone)]
pub struct HeaderNormalizer {
    table: HashMap<String, CanonicalField>,
}

impl HeaderNormalizer {
    /// Build from a raw-header → canonical-name table.
    ///
    /// Canonical names always map to themselves. A table value that is not a
    /// canonical name is a configuration error.
    pub fn from_table<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Result<Self> {
        let mut table: HashMap<String, CanonicalField> = CanonicalField::ALL
            .into_iter()
            .map(|f| (f.name().to_string(), f))
            .collect();

        for (raw, target) in entries {
            let field = CanonicalField::from_name(target).ok_or_else(|| {
                SalError::Config(format!(
                    "Header mapping '{}' targets unknown field '{}'",
                    raw, target
                ))
            })?;
            table.insert(normalize_key(raw), field);
        }

        Ok(Self { table })
    }

    /// Resolve a raw header to its canonical field.
    pub fn normalize(&self, header: &str) -> Result<CanonicalField> {
        self.table
            .get(&normalize_key(header))
            .copied()
            .ok_or_else(|| SalError::HeaderMapping {
                header: header.to_string(),
            })
    }

    /// Number of entries, including the built-in canonical names.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
