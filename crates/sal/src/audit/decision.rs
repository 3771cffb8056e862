//! Curator responses and the decisions recorded for them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A curator's answer to one pending confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "response", content = "pdf_start_page")]
pub enum Response {
    /// Keep the computed PDF start page.
    Accept,
    /// Replace it with the given page.
    Override(u32),
}

/// How a record's PDF start page was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    /// Computed value confirmed as-is.
    Accepted,
    /// Curator supplied a different value.
    Overridden,
}

impl DecisionStatus {
    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DecisionStatus::Accepted => "Accepted",
            DecisionStatus::Overridden => "Overridden",
        }
    }
}

/// Audit trail entry for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditDecision {
    /// Position of the record in the dataset.
    pub index: usize,

    /// Spreadsheet row of the record.
    pub row: usize,

    pub status: DecisionStatus,

    /// Value the offset policy proposed.
    pub expected_pdf_start_page: u32,

    /// Value that was kept.
    pub pdf_start_page: u32,

    /// Session that made the decision.
    pub session_id: Uuid,

    pub decided_at: DateTime<Utc>,

    /// Set when the kept value steps back from the previous record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<MonotonicityWarning>,
}

/// A PDF start page lower than the previous record's.
///
/// Not an error: errata and appended material legitimately step back, and
/// the curator has the final word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonotonicityWarning {
    pub row: usize,
    pub pdf_start_page: u32,
    pub previous_row: usize,
    pub previous_pdf_start_page: u32,
}

impl fmt::Display for MonotonicityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: PDF start page {} is before page {} of row {}",
            self.row, self.pdf_start_page, self.previous_pdf_start_page, self.previous_row
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serde() {
        let json = serde_json::to_value(Response::Override(12)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"response": "override", "pdf_start_page": 12})
        );
        let back: Response = serde_json::from_value(json).unwrap();
        assert_eq!(back, Response::Override(12));

        let accept: Response = serde_json::from_str(r#"{"response": "accept"}"#).unwrap();
        assert_eq!(accept, Response::Accept);
    }

    #[test]
    fn test_warning_display() {
        let warning = MonotonicityWarning {
            row: 5,
            pdf_start_page: 10,
            previous_row: 4,
            previous_pdf_start_page: 12,
        };
        assert_eq!(
            warning.to_string(),
            "row 5: PDF start page 10 is before page 12 of row 4"
        );
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(DecisionStatus::Accepted.label(), "Accepted");
        assert_eq!(DecisionStatus::Overridden.label(), "Overridden");
    }
}
