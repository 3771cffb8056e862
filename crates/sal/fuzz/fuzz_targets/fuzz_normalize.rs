//! Fuzz target for record normalization.
//!
//! Arbitrary cell values must produce a record or an error, never a panic.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use sal::{CongressConfig, DataTable, MappingTables, Normalizer};

#[derive(Debug, Arbitrary)]
struct Row {
    session: String,
    statute_type: String,
    chapter: String,
    title: String,
    public_private: String,
    volume: String,
    start_page: String,
    end_page: String,
    date: String,
    pdf_start: String,
}

const CONFIG: &str = r#"
congress: 1st Congress
input_file: LoC_1.csv
public_pdf_url: https://example.org/public.pdf
private_pdf_url: https://example.org/private.pdf
start_date: 1789-03-04
end_date: 1791-03-03
output_file: congress-1.html
"#;

fuzz_target!(|rows: Vec<Row>| {
    let Ok(config) = CongressConfig::from_yaml(CONFIG) else {
        return;
    };
    let Ok(tables) = MappingTables::from_yaml("", "\"Law\": law\n\"Res.\": resolution\n") else {
        return;
    };

    let headers = [
        "session",
        "statute_type",
        "chapter_or_number",
        "title",
        "public_private",
        "volume",
        "start_page",
        "end_page",
        "date",
        "pdf_start_page",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    let rows = rows
        .into_iter()
        .take(64)
        .map(|r| {
            vec![
                r.session,
                r.statute_type,
                r.chapter,
                r.title,
                r.public_private,
                r.volume,
                r.start_page,
                r.end_page,
                r.date,
                r.pdf_start,
            ]
        })
        .collect();

    let table = DataTable::new(headers, rows, 2);
    let _ = Normalizer::new(&tables, &config).normalize_table(&table);
});
