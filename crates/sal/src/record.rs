//! The canonical statute record.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SalError};
use crate::mapping::{StatuteType, Visibility};
use crate::numeral::to_roman;

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// One normalized statute, the unit of work from audit through generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Spreadsheet row the record was read from.
    pub row: usize,

    /// Session number within the Congress.
    pub session: u32,

    pub statute_type: StatuteType,

    /// Display label: the category label, or the worksheet's own label for
    /// special pages ("Index", "Preface", ...).
    pub label: String,

    /// Chapter or number identifier as written.
    pub chapter_or_number: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_private: Option<Visibility>,

    pub volume: u32,
    pub start_page: u32,
    pub end_page: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Physical PDF page where the statute begins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_start_page: Option<u32>,

    /// Confirmed by a curator.
    #[serde(default)]
    pub audited: bool,
}

impl CanonicalRecord {
    /// Printed pages covered beyond the first (`end_page - start_page`).
    pub fn page_span(&self) -> u32 {
        self.end_page.saturating_sub(self.start_page)
    }

    /// Standard citation, e.g. `1 Stat. 23`.
    pub fn citation(&self) -> String {
        format!("{} Stat. {}", self.volume, self.start_page)
    }

    /// Session heading, e.g. `Session II`.
    pub fn session_heading(&self) -> Result<String> {
        Ok(format!("Session {}", to_roman(self.session)?))
    }

    /// First run of digits in the chapter/number field.
    pub fn number(&self) -> Option<u32> {
        leading_number(&self.chapter_or_number)
    }

    /// Title prefixed with the Roman form of the record's number
    /// (`"IV. Title"`), as printed for acts, resolutions, and appendices.
    pub fn numbered_title(&self) -> Result<String> {
        let number = self.number().ok_or_else(|| {
            SalError::invalid(
                self.row,
                "chapter_or_number",
                format!("'{}' has no number", self.chapter_or_number),
            )
        })?;
        Ok(format!("{}. {}", to_roman(number)?, self.title))
    }

    /// Whether the statute is printed in the private-law volume.
    pub fn is_private(&self) -> bool {
        self.statute_type == StatuteType::PrivateLaw
    }

    /// One-line description for prompts and logs.
    pub fn describe(&self) -> String {
        let mut out = format!("{} {}", self.label, self.chapter_or_number.trim());
        if !self.title.is_empty() {
            out.push_str(" - ");
            out.push_str(&self.title);
        }
        out
    }
}

/// First run of ASCII digits in `text`, if any.
pub fn leading_number(text: &str) -> Option<u32> {
    DIGITS
        .find(text)
        .and_then(|m| m.as_str().parse::<u32>().ok())
}
