//! Rules for the expected PDF start page of a record.
//!
//! How printed pages relate to physical PDF pages varies between volumes
//! (plates, blank versos, appended errata), so the rule is a policy chosen
//! per dataset and the curator confirms or corrects every value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::CanonicalRecord;

/// Computes the PDF start page proposed to the curator.
pub trait OffsetPolicy: Send + Sync {
    /// `previous` is the record just before `current`, already audited.
    fn expected(&self, previous: Option<&CanonicalRecord>, current: &CanonicalRecord) -> u32;
}

/// Previous PDF start plus the previous statute's page span: the next
/// statute begins on the page where the previous one ended.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanOffset;

impl OffsetPolicy for SpanOffset {
    fn expected(&self, previous: Option<&CanonicalRecord>, current: &CanonicalRecord) -> u32 {
        match previous_pdf_start(previous) {
            Some((prev, pdf)) => pdf.saturating_add(prev.page_span()),
            None => current.pdf_start_page.unwrap_or(1),
        }
    }
}

/// Previous PDF start plus the printed distance between the two statutes.
/// Falls back to [`SpanOffset`] across a volume boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageDeltaOffset;

impl OffsetPolicy for PageDeltaOffset {
    fn expected(&self, previous: Option<&CanonicalRecord>, current: &CanonicalRecord) -> u32 {
        match previous_pdf_start(previous) {
            Some((prev, pdf))
                if prev.volume == current.volume && current.start_page >= prev.start_page =>
            {
                pdf.saturating_add(current.start_page - prev.start_page)
            }
            _ => SpanOffset.expected(previous, current),
        }
    }
}

/// The worksheet's own "PDF Start" value when present, otherwise
/// [`PageDeltaOffset`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordedOffset;

impl OffsetPolicy for RecordedOffset {
    fn expected(&self, previous: Option<&CanonicalRecord>, current: &CanonicalRecord) -> u32 {
        current
            .pdf_start_page
            .unwrap_or_else(|| PageDeltaOffset.expected(previous, current))
    }
}

fn previous_pdf_start(previous: Option<&CanonicalRecord>) -> Option<(&CanonicalRecord, u32)> {
    previous.and_then(|p| p.pdf_start_page.map(|pdf| (p, pdf)))
}

/// Configurable selection of the built-in policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetPolicyKind {
    #[default]
    Recorded,
    PageDelta,
    Span,
}

impl OffsetPolicyKind {
    /// Instantiate the policy.
    pub fn policy(&self) -> Box<dyn OffsetPolicy> {
        match self {
            OffsetPolicyKind::Recorded => Box::new(RecordedOffset),
            OffsetPolicyKind::PageDelta => Box::new(PageDeltaOffset),
            OffsetPolicyKind::Span => Box::new(SpanOffset),
        }
    }
}

impl FromStr for OffsetPolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "recorded" => Ok(OffsetPolicyKind::Recorded),
            "page-delta" | "delta" => Ok(OffsetPolicyKind::PageDelta),
            "span" => Ok(OffsetPolicyKind::Span),
            _ => Err(format!(
                "Unknown offset policy: {}. Use recorded, page-delta, or span.",
                s
            )),
        }
    }
}

impl fmt::Display for OffsetPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffsetPolicyKind::Recorded => write!(f, "recorded"),
            OffsetPolicyKind::PageDelta => write!(f, "page-delta"),
            OffsetPolicyKind::Span => write!(f, "span"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fixtures::record;

    fn audited(row: usize, start: u32, end: u32, pdf: u32) -> CanonicalRecord {
        let mut r = record(row, start, end);
        r.pdf_start_page = Some(pdf);
        r.audited = true;
        r
    }

    #[test]
    fn test_first_record() {
        let first = record(2, 1, 3);
        assert_eq!(SpanOffset.expected(None, &first), 1);
        assert_eq!(PageDeltaOffset.expected(None, &first), 1);

        let mut recorded = record(2, 1, 3);
        recorded.pdf_start_page = Some(17);
        assert_eq!(SpanOffset.expected(None, &recorded), 17);
    }

    #[test]
    fn test_span() {
        let prev = audited(2, 23, 27, 40);
        let cur = record(3, 27, 28);
        assert_eq!(SpanOffset.expected(Some(&prev), &cur), 44);
    }

    #[test]
    fn test_page_delta_same_volume() {
        let prev = audited(2, 23, 24, 40);
        let cur = record(3, 30, 31);
        assert_eq!(PageDeltaOffset.expected(Some(&prev), &cur), 47);
    }

    #[test]
    fn test_page_delta_falls_back_across_volumes() {
        let prev = audited(2, 23, 25, 40);
        let mut cur = record(3, 1, 2);
        cur.volume = 2;
        assert_eq!(PageDeltaOffset.expected(Some(&prev), &cur), 42);
    }

    #[test]
    fn test_recorded_prefers_worksheet_value() {
        let prev = audited(2, 23, 24, 40);
        let mut cur = record(3, 30, 31);
        cur.pdf_start_page = Some(50);
        assert_eq!(RecordedOffset.expected(Some(&prev), &cur), 50);

        cur.pdf_start_page = None;
        assert_eq!(RecordedOffset.expected(Some(&prev), &cur), 47);
    }

    #[test]
    fn test_page_at_u32_limit_saturates() {
        let prev = audited(2, 23, 27, u32::MAX);
        let cur = record(3, 30, 31);
        assert_eq!(SpanOffset.expected(Some(&prev), &cur), u32::MAX);
        assert_eq!(PageDeltaOffset.expected(Some(&prev), &cur), u32::MAX);
        assert_eq!(RecordedOffset.expected(Some(&prev), &cur), u32::MAX);
    }

    #[test]
    fn test_kind_parse_and_display() {
        assert_eq!("page_delta".parse::<OffsetPolicyKind>().unwrap(), OffsetPolicyKind::PageDelta);
        assert_eq!("SPAN".parse::<OffsetPolicyKind>().unwrap(), OffsetPolicyKind::Span);
        assert!("guess".parse::<OffsetPolicyKind>().is_err());
        assert_eq!(OffsetPolicyKind::PageDelta.to_string(), "page-delta");
        assert_eq!(OffsetPolicyKind::default(), OffsetPolicyKind::Recorded);
    }
}
