//! Spreadsheet reading through calamine
//!
//! Two of the strategy chain's readers live here: the standards-compliant
//! `.xlsx` reader and the legacy binary `.xls` reader. Both take a fresh
//! cursor over the original bytes, so a failed attempt never poisons the
//! input of the next strategy.

use crate::error::{IngestError, Result};
use crate::parse::{rows_to_table, ParseOptions};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use chrono::NaiveDateTime;
use std::io::Cursor;
use tabdrive_common::types::{CellValue, Table};

/// Read an OOXML workbook with the standards-compliant reader
pub fn read_xlsx(bytes: &[u8], options: &ParseOptions) -> Result<Table> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        Xlsx::new(cursor).map_err(|e| IngestError::Spreadsheet(e.to_string()))?;
    let range = select_range(&mut workbook, options)?;
    range_to_table(&range, options)
}

/// Read a legacy binary workbook
pub fn read_xls(bytes: &[u8], options: &ParseOptions) -> Result<Table> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        Xls::new(cursor).map_err(|e| IngestError::Spreadsheet(e.to_string()))?;
    let range = select_range(&mut workbook, options)?;
    range_to_table(&range, options)
}

/// Select a worksheet by name, or the first by position
fn select_range<RS, R>(workbook: &mut R, options: &ParseOptions) -> Result<Range<Data>>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    match &options.sheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .map_err(|e| IngestError::Spreadsheet(format!("worksheet '{}': {}", name, e))),
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::Spreadsheet("workbook has no sheets".to_string()))?
            .map_err(|e| IngestError::Spreadsheet(e.to_string())),
    }
}

fn range_to_table(range: &Range<Data>, options: &ParseOptions) -> Result<Table> {
    let rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(data_to_cell).collect())
        .collect();

    rows_to_table(rows, options.header_row, false)
}

fn data_to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Int(v) => CellValue::Int(*v),
        Data::Float(v) => CellValue::Float(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::String(v) => {
            if v.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(v.clone())
            }
        },
        Data::DateTime(v) => match v.as_datetime() {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Float(v.as_f64()),
        },
        Data::DateTimeIso(v) => match parse_iso_datetime(v) {
            Some(dt) => CellValue::DateTime(dt),
            None => CellValue::Text(v.clone()),
        },
        Data::DurationIso(v) => CellValue::Text(v.clone()),
        Data::Error(_) => CellValue::Null,
    }
}

pub(super) fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
