//! Raw worksheet rows → canonical records.
//!
//! Every mapping and range check happens here, before any audit work starts,
//! so a curator never reviews a record that cannot be generated.

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::config::CongressConfig;
use crate::error::{Result, SalError};
use crate::input::{DataTable, RawRecord};
use crate::mapping::{CanonicalField, MappingTables, StatuteType, Visibility};
use crate::numeral::to_roman;
use crate::record::{CanonicalRecord, leading_number};

/// Date layouts found in exported worksheets.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"];

/// Datetime layouts (spreadsheet exports of date cells).
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Canonical field → raw header, in worksheet column order.
pub type ColumnMap = IndexMap<CanonicalField, String>;

/// Turns raw worksheet rows into validated [`CanonicalRecord`]s.
pub struct Normalizer<'a> {
    tables: &'a MappingTables,
    config: &'a CongressConfig,
}

impl<'a> Normalizer<'a> {
    pub fn new(tables: &'a MappingTables, config: &'a CongressConfig) -> Self {
        Self { tables, config }
    }

    /// Resolve every raw header. Any unmapped header aborts the whole file.
    pub fn resolve_headers(&self, headers: &[String]) -> Result<ColumnMap> {
        let mut columns = ColumnMap::new();
        let mut first_error = None;

        for header in headers {
            match self.tables.headers.normalize(header) {
                Ok(CanonicalField::Ignore) => {
                    debug!(header = %header, "ignoring column");
                }
                Ok(field) => {
                    if let Some(existing) = columns.get(&field) {
                        return Err(SalError::DuplicateField {
                            field: field.name().to_string(),
                            first: existing.clone(),
                            second: header.clone(),
                        });
                    }
                    columns.insert(field, header.clone());
                }
                Err(e) => {
                    error!(header = %header, "unmapped header");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        for field in CanonicalField::ALL {
            if field.is_required() && !columns.contains_key(&field) {
                return Err(SalError::MissingField {
                    field: field.name().to_string(),
                });
            }
        }

        Ok(columns)
    }

    /// Normalize a whole worksheet.
    ///
    /// Blank rows are skipped. Every failing row is logged; the first failure
    /// is returned.
    pub fn normalize_table(&self, table: &DataTable) -> Result<Vec<CanonicalRecord>> {
        let columns = self.resolve_headers(&table.headers)?;

        let mut records = Vec::with_capacity(table.row_count());
        let mut failures = Vec::new();

        for raw in table.records() {
            if raw.is_blank() {
                debug!(row = raw.row, "skipping blank row");
                continue;
            }
            match self.normalize_record(&raw, &columns) {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(row = raw.row, "{}", e);
                    failures.push(e);
                }
            }
        }

        if !failures.is_empty() {
            let count = failures.len();
            let first = failures.remove(0);
            error!(rejected = count, "normalization failed");
            return Err(first);
        }

        if records.is_empty() {
            return Err(SalError::EmptyData("No statute rows found".to_string()));
        }

        warn_out_of_order(&records);
        info!(records = records.len(), "normalized worksheet");
        Ok(records)
    }

    /// Normalize a single row.
    pub fn normalize_record(&self, raw: &RawRecord, columns: &ColumnMap) -> Result<CanonicalRecord> {
        let row = raw.row;
        let cell = |field: CanonicalField| cell_value(raw, columns, field);

        let public_private = match non_null(cell(CanonicalField::PublicPrivate)) {
            None => None,
            Some(value) => Some(Visibility::parse(value).ok_or_else(|| {
                SalError::invalid(
                    row,
                    "public_private",
                    format!("expected Public or Private, got '{}'", value),
                )
            })?),
        };

        let raw_type = cell(CanonicalField::StatuteType);
        let statute_type = self
            .tables
            .statute_types
            .normalize(raw_type, public_private, row)?;

        let public_private = match (statute_type, public_private) {
            (StatuteType::PublicLaw, None) => Some(Visibility::Public),
            (StatuteType::PrivateLaw, None) => Some(Visibility::Private),
            (StatuteType::PublicLaw, Some(Visibility::Private))
            | (StatuteType::PrivateLaw, Some(Visibility::Public)) => {
                warn!(
                    row,
                    label = raw_type,
                    "statute type and Public/Private column disagree; keeping the column"
                );
                public_private
            }
            (_, v) => v,
        };

        let session_text = cell(CanonicalField::Session);
        let session = leading_number(session_text).ok_or_else(|| {
            SalError::invalid(
                row,
                "session",
                format!("no session number in '{}'", session_text),
            )
        })?;
        // Sessions are cited in Roman form; reject what cannot be written.
        to_roman(session).map_err(|e| SalError::invalid(row, "session", e.to_string()))?;

        let chapter_or_number = cell(CanonicalField::ChapterOrNumber).to_string();
        if statute_type.is_numbered() {
            let number = leading_number(&chapter_or_number).ok_or_else(|| {
                SalError::invalid(
                    row,
                    "chapter_or_number",
                    format!("{} needs a number, got '{}'", statute_type.label(), chapter_or_number),
                )
            })?;
            to_roman(number)
                .map_err(|e| SalError::invalid(row, "chapter_or_number", e.to_string()))?;
        }

        let volume = parse_page(row, "volume", cell(CanonicalField::Volume))?;
        let start_page = parse_page(row, "start_page", cell(CanonicalField::StartPage))?;
        let end_page = parse_page(row, "end_page", cell(CanonicalField::EndPage))?;
        if end_page < start_page {
            return Err(SalError::invalid(
                row,
                "end_page",
                format!("end page {} is before start page {}", end_page, start_page),
            ));
        }

        let date = match non_null(cell(CanonicalField::Date)) {
            None if statute_type.is_dated() => {
                return Err(SalError::invalid(
                    row,
                    "date",
                    format!("{} requires a date", statute_type.label()),
                ));
            }
            None => None,
            Some(text) => {
                let date = parse_date(text).ok_or_else(|| {
                    SalError::invalid(row, "date", format!("unrecognized date '{}'", text))
                })?;
                if !self.config.contains_date(date) {
                    return Err(SalError::invalid(
                        row,
                        "date",
                        format!(
                            "{} is outside {} ({} to {})",
                            date, self.config.congress, self.config.start_date, self.config.end_date
                        ),
                    ));
                }
                Some(date)
            }
        };

        let pdf_start_page = match non_null(cell(CanonicalField::PdfStartPage)) {
            None => None,
            Some(text) => Some(parse_page(row, "pdf_start_page", text)?),
        };

        let label = if statute_type == StatuteType::SpecialPage {
            raw_type.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            statute_type.label().to_string()
        };

        Ok(CanonicalRecord {
            row,
            session,
            statute_type,
            label,
            chapter_or_number,
            title: non_null(cell(CanonicalField::Title)).unwrap_or("").to_string(),
            public_private,
            volume,
            start_page,
            end_page,
            date,
            pdf_start_page,
            audited: false,
        })
    }
}

fn cell_value<'r>(raw: &'r RawRecord, columns: &ColumnMap, field: CanonicalField) -> &'r str {
    columns
        .get(&field)
        .and_then(|header| raw.get(header))
        .map(str::trim)
        .unwrap_or("")
}

fn non_null(value: &str) -> Option<&str> {
    if DataTable::is_null_value(value) {
        None
    } else {
        Some(value)
    }
}

/// Parse a positive page-like integer. Spreadsheet exports often write
/// whole numbers as `12.0`.
fn parse_page(row: usize, field: &str, text: &str) -> Result<u32> {
    let trimmed = text.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    match digits.parse::<u32>() {
        Ok(0) => Err(SalError::invalid(row, field, "must be at least 1")),
        Ok(n) => Ok(n),
        Err(_) if trimmed.is_empty() => Err(SalError::invalid(row, field, "is empty")),
        Err(_) => Err(SalError::invalid(
            row,
            field,
            format!("expected a whole number, got '{}'", trimmed),
        )),
    }
}

/// Parse a worksheet date cell.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Records are expected in session/page order; flag rows that step back.
fn warn_out_of_order(records: &[CanonicalRecord]) {
    for pair in records.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        let prev_key = (prev.session, prev.volume, prev.start_page);
        let cur_key = (cur.session, cur.volume, cur.start_page);
        if cur_key < prev_key {
            warn!(
                row = cur.row,
                previous_row = prev.row,
                "record is out of session/page order"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: &str = r#"
"Sess.": session
"Type": statute_type
"Number/Chapter": chapter_or_number
"Title": title
"Public/Private": public_private
"Vol.": volume
"Start Page": start_page
"End Page": end_page
"Date": date
"PDF Start": pdf_start_page
"Notes": ignore
"#;

    const STATUTES: &str = r#"
"Pub.Res.": resolution
"Law": law
"Index": special-page
"Articles": articles
"#;

    fn tables() -> MappingTables {
        MappingTables::from_yaml(HEADERS, STATUTES).unwrap()
    }

    fn config() -> CongressConfig {
        CongressConfig::from_yaml(
            r#"
congress: 1st Congress
input_file: LoC_1.csv
public_pdf_url: https://example.org/public.pdf
private_pdf_url: https://example.org/private.pdf
start_date: 1789-03-04
end_date: 1791-03-03
output_file: congress-1.html
"#,
        )
        .unwrap()
    }

    fn headers() -> Vec<String> {
        [
            "Sess.",
            "Type",
            "Number/Chapter",
            "Title",
            "Public/Private",
            "Vol.",
            "Start Page",
            "End Page",
            "Date",
            "PDF Start",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn table(rows: &[&[&str]]) -> DataTable {
        DataTable::new(
            headers(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            2,
        )
    }

    #[test]
    fn test_normalize_law_row() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let records = normalizer
            .normalize_table(&table(&[&[
                "1st Session", "Law", "Chap. 1", "An Act to regulate oaths", "Public", "1", "23", "24",
                "1789-06-01", "45",
            ]]))
            .unwrap();

        let r = &records[0];
        assert_eq!(r.row, 2);
        assert_eq!(r.session, 1);
        assert_eq!(r.statute_type, StatuteType::PublicLaw);
        assert_eq!(r.label, "Public Law");
        assert_eq!(r.public_private, Some(Visibility::Public));
        assert_eq!((r.volume, r.start_page, r.end_page), (1, 23, 24));
        assert_eq!(r.date, NaiveDate::from_ymd_opt(1789, 6, 1));
        assert_eq!(r.pdf_start_page, Some(45));
        assert!(!r.audited);
    }

    #[test]
    fn test_single_page_statute_is_accepted() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let records = normalizer
            .normalize_table(&table(&[&[
                "1", "Pub.Res.", "No. 2", "Resolution", "", "1", "97", "97", "1790-08-12", "",
            ]]))
            .unwrap();
        assert_eq!(records[0].statute_type, StatuteType::Resolution);
        assert_eq!(records[0].page_span(), 0);
        assert_eq!(records[0].pdf_start_page, None);
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let err = normalizer
            .normalize_table(&table(&[&[
                "1", "Pub.Res.", "No. 2", "Resolution", "", "1", "97", "96", "1790-08-12", "",
            ]]))
            .unwrap_err();
        match err {
            SalError::InvalidRecord { row, field, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "end_page");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unmapped_header_aborts() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let mut h = headers();
        h.push("Remarks".to_string());
        let err = normalizer.resolve_headers(&h).unwrap_err();
        assert!(matches!(err, SalError::HeaderMapping { header } if header == "Remarks"));
    }

    #[test]
    fn test_ignored_and_duplicate_headers() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);

        let mut h = headers();
        h.push("Notes".to_string());
        let columns = normalizer.resolve_headers(&h).unwrap();
        assert!(!columns.contains_key(&CanonicalField::Ignore));

        let mut h = headers();
        h.push("session".to_string());
        let err = normalizer.resolve_headers(&h).unwrap_err();
        assert!(matches!(err, SalError::DuplicateField { .. }));
    }

    #[test]
    fn test_missing_required_field() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let h: Vec<String> = headers().into_iter().filter(|h| h != "Date").collect();
        let err = normalizer.resolve_headers(&h).unwrap_err();
        assert!(matches!(err, SalError::MissingField { field } if field == "date"));
    }

    #[test]
    fn test_unmapped_statute_type_reports_row() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let err = normalizer
            .normalize_table(&table(&[
                &["1", "Law", "Chap. 1", "A", "Public", "1", "1", "2", "1789-06-01", ""],
                &["1", "Joint Res.", "No. 1", "B", "", "1", "3", "3", "1789-06-02", ""],
            ]))
            .unwrap_err();
        assert!(matches!(err, SalError::StatuteTypeMapping { row: 3, .. }));
    }

    #[test]
    fn test_date_outside_congress() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let err = normalizer
            .normalize_table(&table(&[&[
                "1", "Law", "Chap. 1", "A", "Public", "1", "1", "2", "1801-01-01", "",
            ]]))
            .unwrap_err();
        assert!(matches!(err, SalError::InvalidRecord { ref field, .. } if field == "date"));
    }

    #[test]
    fn test_undated_categories_and_special_page_label() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let records = normalizer
            .normalize_table(&table(&[
                &["1", "Articles", "", "Articles of Confederation", "", "1", "4", "9", "", ""],
                &["1", "Index", "", "Index to the laws", "", "1", "10", "30", "", ""],
            ]))
            .unwrap();
        assert_eq!(records[0].date, None);
        assert_eq!(records[1].statute_type, StatuteType::SpecialPage);
        assert_eq!(records[1].label, "Index");
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let records = normalizer
            .normalize_table(&table(&[
                &["", "", "", "", "", "", "", "", "", ""],
                &["1", "Law", "Chap. 1", "A", "Private", "6", "1", "1", "1789-06-01", "2.0"],
            ]))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row, 3);
        assert_eq!(records[0].statute_type, StatuteType::PrivateLaw);
        assert_eq!(records[0].pdf_start_page, Some(2));
    }

    #[test]
    fn test_resolution_without_number() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);
        let err = normalizer
            .normalize_table(&table(&[&[
                "1", "Pub.Res.", "n/a", "R", "", "1", "1", "1", "1789-06-01", "",
            ]]))
            .unwrap_err();
        assert!(matches!(err, SalError::InvalidRecord { ref field, .. } if field == "chapter_or_number"));
    }

    #[test]
    fn test_numbers_beyond_roman_range_report_row() {
        let (tables, config) = (tables(), config());
        let normalizer = Normalizer::new(&tables, &config);

        let err = normalizer
            .normalize_table(&table(&[&[
                "4000", "Law", "Chap. 1", "A", "Public", "1", "1", "1", "1789-06-01", "",
            ]]))
            .unwrap_err();
        assert!(matches!(
            err,
            SalError::InvalidRecord { row: 2, ref field, .. } if field == "session"
        ));

        let err = normalizer
            .normalize_table(&table(&[
                &["1", "Law", "Chap. 1", "A", "Public", "1", "1", "1", "1789-06-01", ""],
                &["1", "Pub.Res.", "No. 4000", "R", "", "1", "2", "2", "1789-06-02", ""],
            ]))
            .unwrap_err();
        assert!(matches!(
            err,
            SalError::InvalidRecord { row: 3, ref field, .. } if field == "chapter_or_number"
        ));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1789, 9, 24);
        assert_eq!(parse_date("1789-09-24"), expected);
        assert_eq!(parse_date("09/24/1789"), expected);
        assert_eq!(parse_date("September 24, 1789"), expected);
        assert_eq!(parse_date("1789-09-24 00:00:00"), expected);
        assert_eq!(parse_date("sometime in 1789"), None);
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page(2, "volume", "12").unwrap(), 12);
        assert_eq!(parse_page(2, "volume", "12.0").unwrap(), 12);
        assert!(parse_page(2, "volume", "0").is_err());
        assert!(parse_page(2, "volume", "").is_err());
        assert!(parse_page(2, "volume", "twelve").is_err());
    }
}
