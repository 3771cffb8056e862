//! Integration tests for loading and normalizing worksheets.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use sal::{Pipeline, SalError, StatuteType, Visibility};

const HEADER_MAP: &str = r#"
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

const STATUTE_MAP: &str = r#"
"Law": law
"Pub.Res.": resolution
"Treaty": treaty
"Index": special-page
"#;

const CONFIG: &str = r#"
congress: 1st Congress
input_file: LoC_1.csv
public_pdf_url: https://example.org/public.pdf
private_pdf_url: https://example.org/private.pdf
start_date: 1789-03-04
end_date: 1791-03-03
output_file: congress-1.html
"#;

const HEADER: &str = "Sess.,Type,Number/Chapter,Title,Public/Private,Vol.,Start Page,End Page,Date,PDF Start,Notes";

/// Lay out a project directory and return it.
fn project(worksheet: &str) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write(dir.path(), "user-config.yaml", CONFIG);
    write(dir.path(), "maps/header-map.yaml", HEADER_MAP);
    write(dir.path(), "maps/statute-map.yaml", STATUTE_MAP);
    write(dir.path(), "LoC_1.csv", worksheet);
    dir
}

fn write(root: &Path, name: &str, contents: &str) {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn worksheet(rows: &[&str]) -> String {
    let mut out = format!("{}\n", HEADER);
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    out
}

#[test]
fn test_prepare_normalizes_every_row() {
    let dir = project(&worksheet(&[
        "1,Law,Chap. 1,An Act to regulate the Time and Manner of administering certain Oaths,Public,1,23,24,1789-06-01,45,",
        "1,Pub.Res.,No. 2,A Resolution on the census,,1,97,97,1790-08-12,,checked",
        "2,Law,Chap. 3,An Act for the relief of Jonathan Dayton,Private,6,1,1,1790-06-04,,",
        "2,Index,,General index,,1,600,612,,,",
    ]));
    let pipeline = Pipeline::load(dir.path().join("user-config.yaml")).unwrap();
    let prepared = pipeline.prepare().unwrap();

    assert_eq!(prepared.dataset, "LoC_1");
    assert!(prepared.source.hash.starts_with("sha256:"));
    assert_eq!(prepared.records.len(), 4);

    let law = &prepared.records[0];
    assert_eq!(law.row, 2);
    assert_eq!(law.statute_type, StatuteType::PublicLaw);
    assert_eq!(law.pdf_start_page, Some(45));

    let resolution = &prepared.records[1];
    assert_eq!(resolution.statute_type, StatuteType::Resolution);
    assert_eq!(resolution.page_span(), 0);
    assert_eq!(resolution.pdf_start_page, None);

    let private = &prepared.records[2];
    assert_eq!(private.statute_type, StatuteType::PrivateLaw);
    assert_eq!(private.public_private, Some(Visibility::Private));
    assert_eq!(private.session, 2);

    let index = &prepared.records[3];
    assert_eq!(index.statute_type, StatuteType::SpecialPage);
    assert_eq!(index.label, "Index");
    assert_eq!(index.date, None);
}

#[test]
fn test_start_row_skips_leading_rows() {
    let dir = project(&worksheet(&[
        "note,,,,,,,,,,",
        "1,Treaty,,Treaty with the Creeks,,7,35,38,1790-08-07,,",
    ]));
    let config_path = dir.path().join("user-config.yaml");
    fs::write(&config_path, format!("{}start_row: 3\n", CONFIG)).unwrap();

    let prepared = Pipeline::load(&config_path).unwrap().prepare().unwrap();
    assert_eq!(prepared.records.len(), 1);
    assert_eq!(prepared.records[0].row, 3);
    assert_eq!(prepared.records[0].statute_type, StatuteType::Treaty);
}

#[test]
fn test_unmapped_header_is_reported() {
    let sheet = worksheet(&["1,Law,Chap. 1,Title,Public,1,1,2,1789-06-01,,"])
        .replacen("Notes", "Remarks", 1);
    let dir = project(&sheet);
    let err = Pipeline::load(dir.path().join("user-config.yaml"))
        .unwrap()
        .prepare()
        .unwrap_err();
    match err {
        SalError::HeaderMapping { header } => assert_eq!(header, "Remarks"),
        other => panic!("expected HeaderMapping, got {:?}", other),
    }
}

#[test]
fn test_unmapped_statute_type_names_row() {
    let dir = project(&worksheet(&[
        "1,Law,Chap. 1,Title,Public,1,1,2,1789-06-01,,",
        "1,Memorial,,Title,,1,3,4,1789-06-02,,",
    ]));
    let err = Pipeline::load(dir.path().join("user-config.yaml"))
        .unwrap()
        .prepare()
        .unwrap_err();
    match err {
        SalError::StatuteTypeMapping { label, row } => {
            assert_eq!(label, "Memorial");
            assert_eq!(row, 3);
        }
        other => panic!("expected StatuteTypeMapping, got {:?}", other),
    }
}

#[test]
fn test_first_failure_is_returned() {
    let dir = project(&worksheet(&[
        "1,Law,Chap. 1,Title,Public,1,10,9,1789-06-01,,",
        "1,Law,Chap. 2,Title,Public,1,11,12,1801-01-01,,",
    ]));
    let err = Pipeline::load(dir.path().join("user-config.yaml"))
        .unwrap()
        .prepare()
        .unwrap_err();
    assert!(matches!(
        err,
        SalError::InvalidRecord { row: 2, ref field, .. } if field == "end_page"
    ));
}

#[test]
fn test_law_without_designation_is_invalid() {
    let dir = project(&worksheet(&["1,Law,Chap. 1,Title,,1,1,2,1789-06-01,,"]));
    let err = Pipeline::load(dir.path().join("user-config.yaml"))
        .unwrap()
        .prepare()
        .unwrap_err();
    assert!(matches!(
        err,
        SalError::InvalidRecord { row: 2, ref field, .. } if field == "public_private"
    ));
}

#[test]
fn test_missing_input_file() {
    let dir = project("");
    fs::remove_file(dir.path().join("LoC_1.csv")).unwrap();
    let err = Pipeline::load(dir.path().join("user-config.yaml"))
        .unwrap()
        .prepare()
        .unwrap_err();
    assert!(matches!(err, SalError::Io { .. }));
}

#[test]
fn test_missing_mapping_file() {
    let dir = project(&worksheet(&[]));
    fs::remove_file(dir.path().join("maps/statute-map.yaml")).unwrap();
    assert!(matches!(
        Pipeline::load(dir.path().join("user-config.yaml")),
        Err(SalError::Io { .. })
    ));
}
