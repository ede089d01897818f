//! Raw cell extraction from OOXML archives
//!
//! Reads worksheet XML directly from the zip container, bypassing the
//! standards-compliant reader entirely. Two levels of tolerance:
//!
//! - `Strict` ignores the style part but expects the rest of the archive to
//!   be well formed (the fast, style-free fallback).
//! - `Lenient` is the last-resort manual extraction: a broken style table
//!   is replaced with an empty one, missing shared strings and malformed
//!   cells degrade to nulls, and a sheet that never reaches the header row
//!   gets synthesized positional column names.

use crate::error::{IngestError, Result};
use crate::parse::{rows_to_table, ParseOptions};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use tabdrive_common::types::{CellValue, Table};
use zip::ZipArchive;

type Archive = ZipArchive<Cursor<Vec<u8>>>;

/// Tolerance level of the raw reader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    Strict,
    Lenient,
}

/// Read a worksheet without style interpretation
pub fn read_raw(bytes: &[u8], options: &ParseOptions, strictness: Strictness) -> Result<Table> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec()))?;

    let sheets = load_sheet_catalog(&mut archive, strictness)?;
    let sheet_path = select_sheet(&sheets, options)?;

    let shared = load_shared_strings(&mut archive, strictness)?;

    // the manual-extraction path substitutes an empty style table whenever
    // the real one fails to load; the strict path never opens styles
    let date_styles = match strictness {
        Strictness::Lenient => load_date_styles(&mut archive),
        Strictness::Strict => Vec::new(),
    };

    let sheet_xml = read_part(&mut archive, &sheet_path)?;
    let rows = read_sheet_rows(&sheet_xml, &shared, &date_styles, strictness)?;

    rows_to_table(
        rows,
        options.header_row,
        matches!(strictness, Strictness::Lenient),
    )
}

fn read_part(archive: &mut Archive, name: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(name)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

fn read_part_optional(archive: &mut Archive, name: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(name).ok()?;
    let mut data = Vec::new();
    file.read_to_end(&mut data).ok()?;
    Some(data)
}

/// Worksheet catalog as (name, archive path) pairs in workbook order
fn load_sheet_catalog(
    archive: &mut Archive,
    strictness: Strictness,
) -> Result<Vec<(String, String)>> {
    match load_sheet_catalog_from_workbook(archive) {
        Ok(sheets) if !sheets.is_empty() => Ok(sheets),
        Ok(_) => fallback_sheet_catalog(archive, strictness, "workbook lists no sheets"),
        Err(e) => fallback_sheet_catalog(archive, strictness, &e.to_string()),
    }
}

fn fallback_sheet_catalog(
    archive: &mut Archive,
    strictness: Strictness,
    reason: &str,
) -> Result<Vec<(String, String)>> {
    if strictness == Strictness::Strict {
        return Err(IngestError::Spreadsheet(format!(
            "workbook structure unreadable: {}",
            reason
        )));
    }

    // tolerate a broken workbook part by scanning for worksheet entries
    let mut paths: Vec<String> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter(|name| name.starts_with("xl/worksheets/") && name.ends_with(".xml"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(IngestError::Spreadsheet(format!(
            "no worksheets found in archive ({})",
            reason
        )));
    }

    Ok(paths
        .into_iter()
        .map(|path| {
            let stem = path
                .trim_start_matches("xl/worksheets/")
                .trim_end_matches(".xml")
                .to_string();
            (stem, path)
        })
        .collect())
}

fn load_sheet_catalog_from_workbook(archive: &mut Archive) -> Result<Vec<(String, String)>> {
    let rels = read_part(archive, "xl/_rels/workbook.xml.rels")?;
    let targets = load_relationships(&rels)?;

    let workbook = read_part(archive, "xl/workbook.xml")?;
    let mut reader = Reader::from_reader(workbook.as_slice());
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut rel_id = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    match attr.key.local_name().as_ref() {
                        b"name" => name = Some(attr.unescape_value()?.into_owned()),
                        b"id" => rel_id = Some(attr.unescape_value()?.into_owned()),
                        _ => {},
                    }
                }
                if let (Some(name), Some(rel_id)) = (name, rel_id) {
                    if let Some(target) = targets.iter().find(|(id, _)| *id == rel_id) {
                        sheets.push((name, normalize_target(&target.1)));
                    }
                }
            },
            _ => {},
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Relationship id to target path pairs from a .rels part
fn load_relationships(xml: &[u8]) -> Result<Vec<(String, String)>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut relationships = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        _ => {},
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    relationships.push((id, target));
                }
            },
            _ => {},
        }
        buf.clear();
    }

    Ok(relationships)
}

fn normalize_target(target: &str) -> String {
    let trimmed = target.trim_start_matches('/');
    if trimmed.starts_with("xl/") {
        trimmed.to_string()
    } else {
        format!("xl/{}", trimmed)
    }
}

fn select_sheet(sheets: &[(String, String)], options: &ParseOptions) -> Result<String> {
    match &options.sheet_name {
        Some(name) => sheets
            .iter()
            .find(|(sheet_name, _)| sheet_name == name)
            .map(|(_, path)| path.clone())
            .ok_or_else(|| IngestError::Spreadsheet(format!("worksheet '{}' not found", name))),
        None => sheets
            .first()
            .map(|(_, path)| path.clone())
            .ok_or_else(|| IngestError::Spreadsheet("workbook has no sheets".to_string())),
    }
}

/// Shared string table, indexed by position
fn load_shared_strings(archive: &mut Archive, strictness: Strictness) -> Result<Vec<String>> {
    let xml = match read_part_optional(archive, "xl/sharedStrings.xml") {
        Some(xml) => xml,
        None => return Ok(Vec::new()),
    };

    match parse_shared_strings(&xml) {
        Ok(strings) => Ok(strings),
        Err(_) if strictness == Strictness::Lenient => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut strings = Vec::new();

    let mut in_item = false;
    let mut in_text = false;
    let mut in_phonetic = false;
    let mut current = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = true;
                    current.clear();
                },
                b"rPh" => in_phonetic = true,
                b"t" if in_item && !in_phonetic => in_text = true,
                _ => {},
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"si" => {
                    in_item = false;
                    strings.push(std::mem::take(&mut current));
                },
                b"rPh" => in_phonetic = false,
                b"t" => in_text = false,
                _ => {},
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            _ => {},
        }
        buf.clear();
    }

    Ok(strings)
}

/// Per-style datetime flags from the style part; empty on any failure
fn load_date_styles(archive: &mut Archive) -> Vec<bool> {
    let xml = match read_part_optional(archive, "xl/styles.xml") {
        Some(xml) => xml,
        None => return Vec::new(),
    };
    parse_date_styles(&xml).unwrap_or_default()
}

fn parse_date_styles(xml: &[u8]) -> Result<Vec<bool>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut custom_datetime_ids: Vec<String> = Vec::new();
    let mut in_cell_xfs = false;
    let mut styles = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"numFmt" => {
                    let mut id = None;
                    let mut code = None;
                    for attr in e.attributes() {
                        let attr = attr.map_err(quick_xml::Error::from)?;
                        match attr.key.local_name().as_ref() {
                            b"numFmtId" => id = Some(attr.unescape_value()?.into_owned()),
                            b"formatCode" => code = Some(attr.unescape_value()?.into_owned()),
                            _ => {},
                        }
                    }
                    if let (Some(id), Some(code)) = (id, code) {
                        if format_code_is_datetime(&code) {
                            custom_datetime_ids.push(id);
                        }
                    }
                },
                b"cellXfs" => in_cell_xfs = true,
                b"xf" if in_cell_xfs => {
                    let mut id = String::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(quick_xml::Error::from)?;
                        if attr.key.local_name().as_ref() == b"numFmtId" {
                            id = attr.unescape_value()?.into_owned();
                        }
                    }
                    let is_datetime = builtin_format_is_datetime(&id)
                        || custom_datetime_ids.iter().any(|c| *c == id);
                    styles.push(is_datetime);
                },
                _ => {},
            },
            Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
            _ => {},
        }
        buf.clear();
    }

    Ok(styles)
}

fn builtin_format_is_datetime(id: &str) -> bool {
    matches!(
        id,
        "14" | "15" | "16" | "17" | "18" | "19" | "20" | "21" | "22" | "45" | "46" | "47"
    )
}

/// Detect date/time placeholders in a number format code, skipping quoted
/// literals and color/condition blocks
fn format_code_is_datetime(code: &str) -> bool {
    let mut in_literal = false;
    let mut in_bracket = false;
    let mut escaped = false;
    for c in code.chars() {
        match c {
            _ if escaped => escaped = false,
            '\\' | '_' => escaped = true,
            '"' => in_literal = !in_literal,
            '[' if !in_literal => in_bracket = true,
            ']' if !in_literal => in_bracket = false,
            _ if in_literal || in_bracket => {},
            'y' | 'Y' | 'd' | 'D' | 'h' | 'H' | 's' | 'S' => return true,
            _ => {},
        }
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Number,
    SharedString,
    InlineString,
    Boolean,
    IsoDate,
    Error,
}

/// Extract the cell grid from worksheet XML
fn read_sheet_rows(
    xml: &[u8],
    shared: &[String],
    date_styles: &[bool],
    strictness: Strictness,
) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    let mut current_row: Vec<CellValue> = Vec::new();
    let mut in_row = false;

    let mut cell_kind = CellKind::Number;
    let mut cell_col = 0usize;
    let mut cell_datetime = false;
    let mut in_value = false;
    let mut value = String::new();
    let mut has_value = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                // fill gaps left by sparse rows so physical indexing holds
                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    if attr.key.local_name().as_ref() == b"r" {
                        if let Ok(number) = attr.unescape_value()?.parse::<usize>() {
                            while rows.len() + 1 < number {
                                rows.push(Vec::new());
                            }
                        }
                    }
                }
                in_row = true;
                current_row.clear();
            },
            Event::End(e) if e.local_name().as_ref() == b"row" => {
                in_row = false;
                rows.push(std::mem::take(&mut current_row));
            },
            Event::Start(e) | Event::Empty(e) if in_row && e.local_name().as_ref() == b"c" => {
                cell_kind = CellKind::Number;
                cell_col = current_row.len();
                cell_datetime = false;
                value.clear();
                has_value = false;

                for attr in e.attributes() {
                    let attr = attr.map_err(quick_xml::Error::from)?;
                    let attr_value = attr.unescape_value()?;
                    match attr.key.local_name().as_ref() {
                        b"r" => {
                            if let Some(col) = column_index(&attr_value) {
                                cell_col = col;
                            }
                        },
                        b"t" => {
                            cell_kind = match attr_value.as_ref() {
                                "s" => CellKind::SharedString,
                                "inlineStr" | "str" => CellKind::InlineString,
                                "b" => CellKind::Boolean,
                                "d" => CellKind::IsoDate,
                                "e" => CellKind::Error,
                                _ => CellKind::Number,
                            };
                        },
                        b"s" => {
                            if let Ok(style) = attr_value.parse::<usize>() {
                                cell_datetime = date_styles.get(style).copied().unwrap_or(false);
                            }
                        },
                        _ => {},
                    }
                }
            },
            Event::End(e) if in_row && e.local_name().as_ref() == b"c" => {
                let cell = if has_value {
                    convert_cell(&value, cell_kind, cell_datetime, shared, strictness)?
                } else {
                    CellValue::Null
                };
                while current_row.len() < cell_col {
                    current_row.push(CellValue::Null);
                }
                current_row.push(cell);
            },
            Event::Start(e) if matches!(e.local_name().as_ref(), b"v" | b"t") => {
                in_value = true;
            },
            Event::End(e) if matches!(e.local_name().as_ref(), b"v" | b"t") => {
                in_value = false;
            },
            Event::Text(t) if in_value => {
                value.push_str(&t.unescape()?);
                has_value = true;
            },
            _ => {},
        }
        buf.clear();
    }

    Ok(rows)
}

fn convert_cell(
    raw: &str,
    kind: CellKind,
    is_datetime: bool,
    shared: &[String],
    strictness: Strictness,
) -> Result<CellValue> {
    let failed = |detail: String| -> Result<CellValue> {
        if strictness == Strictness::Lenient {
            // skip malformed cells instead of giving up on the file
            Ok(CellValue::Null)
        } else {
            Err(IngestError::Spreadsheet(detail))
        }
    };

    match kind {
        CellKind::SharedString => match raw.parse::<usize>().ok().and_then(|i| shared.get(i)) {
            Some(s) if s.is_empty() => Ok(CellValue::Null),
            Some(s) => Ok(CellValue::Text(s.clone())),
            None => failed(format!("shared string index '{}' out of range", raw)),
        },
        CellKind::InlineString => {
            if raw.is_empty() {
                Ok(CellValue::Null)
            } else {
                Ok(CellValue::Text(raw.to_string()))
            }
        },
        CellKind::Boolean => match raw {
            "1" | "true" => Ok(CellValue::Bool(true)),
            "0" | "false" => Ok(CellValue::Bool(false)),
            _ => failed(format!("invalid boolean cell '{}'", raw)),
        },
        CellKind::IsoDate => match super::sheet::parse_iso_datetime(raw) {
            Some(dt) => Ok(CellValue::DateTime(dt)),
            None => failed(format!("invalid ISO date cell '{}'", raw)),
        },
        CellKind::Error => Ok(CellValue::Null),
        CellKind::Number => match raw.parse::<f64>() {
            Ok(number) if is_datetime => match excel_serial_to_datetime(number) {
                Some(dt) => Ok(CellValue::DateTime(dt)),
                None => Ok(CellValue::Float(number)),
            },
            Ok(number) => {
                if number.fract() == 0.0 && number.abs() < 9.0e15 {
                    Ok(CellValue::Int(number as i64))
                } else {
                    Ok(CellValue::Float(number))
                }
            },
            Err(_) => failed(format!("invalid numeric cell '{}'", raw)),
        },
    }
}

/// 0-based column index from a cell reference like "BC23"
fn column_index(reference: &str) -> Option<usize> {
    let letters: Vec<char> = reference
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    if letters.is_empty() {
        return None;
    }

    let mut index = 0usize;
    for c in letters {
        index = index * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Excel serial date (1900 system) to a naive datetime
fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let days = serial.trunc() as i64;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    base.checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_index() {
        assert_eq!(column_index("A1"), Some(0));
        assert_eq!(column_index("B2"), Some(1));
        assert_eq!(column_index("Z9"), Some(25));
        assert_eq!(column_index("AA10"), Some(26));
        assert_eq!(column_index("BC23"), Some(54));
        assert_eq!(column_index("123"), None);
    }

    #[test]
    fn test_excel_serial_to_datetime() {
        // 2026-01-01 is serial 46023 in the 1900 system
        let dt = excel_serial_to_datetime(46023.0).unwrap();
        assert_eq!(dt.to_string(), "2026-01-01 00:00:00");

        let with_time = excel_serial_to_datetime(46023.5).unwrap();
        assert_eq!(with_time.to_string(), "2026-01-01 12:00:00");
    }

    #[test]
    fn test_format_code_is_datetime() {
        assert!(format_code_is_datetime("yyyy-mm-dd"));
        assert!(format_code_is_datetime("[$-409]h:mm AM/PM"));
        assert!(format_code_is_datetime("dd/mm/yyyy"));
        assert!(!format_code_is_datetime("0.00"));
        assert!(!format_code_is_datetime("#,##0"));
        // quoted literals don't count as placeholders
        assert!(!format_code_is_datetime("0.0\" yds\""));
    }

    #[test]
    fn test_parse_shared_strings() {
        let xml = br#"<?xml version="1.0"?>
            <sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="2" uniqueCount="2">
              <si><t>alpha</t></si>
              <si><r><t>be</t></r><r><t>ta</t></r></si>
            </sst>"#;
        let strings = parse_shared_strings(xml).unwrap();
        assert_eq!(strings, vec!["alpha".to_string(), "beta".to_string()]);
    }

    #[test]
    fn test_read_sheet_rows_sparse_cells() {
        let xml = br#"<?xml version="1.0"?>
            <worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
              <sheetData>
                <row r="1"><c r="A1" t="s"><v>0</v></c><c r="C1"><v>3</v></c></row>
                <row r="3"><c r="A3"><v>1.5</v></c></row>
              </sheetData>
            </worksheet>"#;
        let shared = vec!["name".to_string()];
        let rows = read_sheet_rows(xml, &shared, &[], Strictness::Strict).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].len(), 3);
        assert_eq!(rows[0][0], CellValue::Text("name".to_string()));
        assert_eq!(rows[0][1], CellValue::Null);
        assert_eq!(rows[0][2], CellValue::Int(3));
        // row 2 was absent from the sheet
        assert!(rows[1].is_empty());
        assert_eq!(rows[2][0], CellValue::Float(1.5));
    }

    #[test]
    fn test_shared_string_out_of_range() {
        let xml = br#"<worksheet><sheetData>
            <row r="1"><c r="A1" t="s"><v>9</v></c></row>
        </sheetData></worksheet>"#;

        let strict = read_sheet_rows(xml, &[], &[], Strictness::Strict);
        assert!(strict.is_err());

        let lenient = read_sheet_rows(xml, &[], &[], Strictness::Lenient).unwrap();
        assert_eq!(lenient[0][0], CellValue::Null);
    }
}
