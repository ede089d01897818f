//! Parsing tests over hand-built workbook archives, including recovery
//! from damaged parts.

mod common;

use common::*;
use tabdrive_ingest::parse::{parse, ParseOptions};
use tabdrive_ingest::IngestError;
use tabdrive_common::types::CellValue;

#[test]
fn reads_a_well_formed_workbook() {
    let bytes = minimal_xlsx();
    let table = parse(&bytes, "report.xlsx", &ParseOptions::default()).unwrap();

    assert_eq!(table.column_names(), &["Region", "Units", "Price"]);
    assert_eq!(table.row_count(), 2);

    let regions = table.column_by_name("Region").unwrap();
    assert_eq!(regions[0], CellValue::Text("North".to_string()));
    assert_eq!(regions[1], CellValue::Text("South".to_string()));

    let units: Vec<String> = table
        .column_by_name("Units")
        .unwrap()
        .iter()
        .map(|c| c.to_string())
        .collect();
    assert_eq!(units, vec!["12", "7"]);
}

#[test]
fn selects_a_worksheet_by_name() {
    let bytes = minimal_xlsx();
    let options = ParseOptions {
        sheet_name: Some("Data".to_string()),
        ..ParseOptions::default()
    };
    let table = parse(&bytes, "report.xlsx", &options).unwrap();
    assert_eq!(table.row_count(), 2);
}

#[test]
fn missing_worksheet_is_unreadable() {
    let bytes = minimal_xlsx();
    let options = ParseOptions {
        sheet_name: Some("Nope".to_string()),
        ..ParseOptions::default()
    };
    let err = parse(&bytes, "report.xlsx", &options).unwrap_err();
    assert!(
        matches!(err, IngestError::UnreadableFile { .. }),
        "got: {err:?}"
    );
}

#[test]
fn recovers_from_inconsistent_cell_style_table() {
    // the only defect is a cellStyleXfs entry count that disagrees with
    // its records; the chain must recover with the full table intact
    let bytes = corrupt_styles_xlsx();
    let table = parse(&bytes, "report.xlsx", &ParseOptions::default()).unwrap();

    assert_eq!(table.column_names(), &["Region", "Units", "Price"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(
        table.column_by_name("Region").unwrap()[0],
        CellValue::Text("North".to_string())
    );
}

#[test]
fn recovers_from_broken_workbook_relationships() {
    // the relationship part is truncated, so readers that resolve sheets
    // through it fail; the lenient extractor still finds the data
    let bytes = xlsx_broken_rels();
    let table = parse(&bytes, "report.xlsx", &ParseOptions::default()).unwrap();

    assert_eq!(table.column_names(), &["Region", "Units", "Price"]);
    assert_eq!(table.row_count(), 2);
}

#[test]
fn header_row_discards_leading_rows() {
    let bytes = minimal_xlsx();
    let options = ParseOptions {
        header_row: 1,
        ..ParseOptions::default()
    };
    let table = parse(&bytes, "report.xlsx", &options).unwrap();

    // the first physical row becomes neither header nor data
    assert_eq!(table.column_names(), &["North", "12", "19.5"]);
    assert_eq!(table.row_count(), 1);
}

#[test]
fn garbage_bytes_are_unreadable() {
    let err = parse(b"definitely not a workbook", "broken.xlsx", &ParseOptions::default())
        .unwrap_err();
    match err {
        IngestError::UnreadableFile { file, detail } => {
            assert_eq!(file, "broken.xlsx");
            assert!(!detail.is_empty());
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn empty_file_is_unreadable() {
    let err = parse(b"", "empty.xlsx", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::UnreadableFile { .. }));
}

#[test]
fn unknown_extension_is_unsupported() {
    let err = parse(b"data", "notes.txt", &ParseOptions::default()).unwrap_err();
    assert!(matches!(err, IngestError::UnsupportedFormat(_)));
}
