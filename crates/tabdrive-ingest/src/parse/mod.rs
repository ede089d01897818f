//! Tabular file parsing
//!
//! Converts raw file bytes plus format-specific options into a [`Table`].
//! Delimited text goes through the `csv` crate; spreadsheet formats run an
//! ordered fallback chain (see [`strategy`]) because source files are
//! frequently corrupted and a single reader is not enough.

pub mod raw;
pub mod repair;
pub mod sheet;
pub mod strategy;

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use tabdrive_common::types::{CellValue, Table};
use tracing::info;

/// Supported file formats, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Spreadsheet,
    Csv,
}

impl FileFormat {
    /// Determine the format from a file name, case-insensitively
    pub fn from_name(file_name: &str) -> Result<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
            Ok(FileFormat::Spreadsheet)
        } else if lower.ends_with(".csv") {
            Ok(FileFormat::Csv)
        } else {
            Err(IngestError::UnsupportedFormat(file_name.to_string()))
        }
    }
}

/// Closed enumeration of CSV delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }
}

impl std::str::FromStr for Delimiter {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "comma" => Ok(Delimiter::Comma),
            "semicolon" => Ok(Delimiter::Semicolon),
            "tab" => Ok(Delimiter::Tab),
            "pipe" => Ok(Delimiter::Pipe),
            _ => Err(IngestError::InvalidParameter(format!(
                "Invalid CSV delimiter: {}",
                s
            ))),
        }
    }
}

/// Format-specific parsing options
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Worksheet to read; None selects the first sheet by position
    pub sheet_name: Option<String>,

    /// 0-based physical row that holds the column names; rows above it are
    /// discarded, not retained as data
    pub header_row: usize,

    /// Delimiter for CSV input; ignored for spreadsheets
    pub delimiter: Option<Delimiter>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            sheet_name: None,
            header_row: 0,
            delimiter: Some(Delimiter::Comma),
        }
    }
}

/// Parse file bytes into a table
pub fn parse(bytes: &[u8], file_name: &str, options: &ParseOptions) -> Result<Table> {
    let format = FileFormat::from_name(file_name)?;

    if bytes.is_empty() {
        return Err(IngestError::UnreadableFile {
            file: file_name.to_string(),
            detail: "file is empty".to_string(),
        });
    }

    let table = match format {
        FileFormat::Csv => parse_csv(bytes, file_name, options)?,
        FileFormat::Spreadsheet => strategy::read_spreadsheet(file_name, bytes, options)?,
    };

    info!(
        file = %file_name,
        rows = table.row_count(),
        columns = table.column_count(),
        "Parsed file"
    );

    Ok(table)
}

/// Parse delimited text
///
/// Bytes are decoded as UTF-8 with replacement characters for invalid
/// sequences; encoding issues never fail the parse outright.
fn parse_csv(bytes: &[u8], file_name: &str, options: &ParseOptions) -> Result<Table> {
    let delimiter = options.delimiter.ok_or_else(|| {
        IngestError::InvalidParameter(format!("CSV file '{}' requires a delimiter", file_name))
    })?;

    let text = String::from_utf8_lossy(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }

    if records.len() <= options.header_row {
        return Err(IngestError::UnreadableFile {
            file: file_name.to_string(),
            detail: format!(
                "header row {} is beyond the end of the file ({} rows)",
                options.header_row,
                records.len()
            ),
        });
    }

    let names = column_names(records[options.header_row].iter());

    let mut table = Table::new(names);
    for record in &records[options.header_row + 1..] {
        table.push_row(record.iter().map(infer_cell).collect());
    }

    Ok(table)
}

/// Column names from header cells, with positional fallbacks for blanks
pub(crate) fn column_names<'a>(cells: impl Iterator<Item = &'a str>) -> Vec<String> {
    cells
        .enumerate()
        .map(|(i, cell)| {
            let trimmed = cell.trim();
            if trimmed.is_empty() {
                format!("column_{}", i)
            } else {
                trimmed.to_string()
            }
        })
        .collect()
}

/// Split grid rows into a header row and data rows
///
/// Rows above the header are discarded. When the grid does not reach the
/// header row, `synthesize` keeps every row as data under positional column
/// names (the manual-extraction fallback); otherwise the grid is rejected.
pub(crate) fn rows_to_table(
    rows: Vec<Vec<CellValue>>,
    header_row: usize,
    synthesize: bool,
) -> Result<Table> {
    if rows.len() > header_row {
        let header: Vec<String> = rows[header_row].iter().map(|c| c.to_string()).collect();
        let names = column_names(header.iter().map(|s| s.as_str()));
        let mut table = Table::new(names);
        for row in rows.into_iter().skip(header_row + 1) {
            table.push_row(row);
        }
        Ok(table)
    } else if synthesize {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let names = (0..width).map(|i| format!("column_{}", i)).collect();
        let mut table = Table::new(names);
        for row in rows {
            table.push_row(row);
        }
        Ok(table)
    } else {
        Err(IngestError::Spreadsheet(format!(
            "header row {} is beyond the sheet data ({} rows)",
            header_row,
            rows.len()
        )))
    }
}

/// Type a raw text cell: integer, float, boolean, else text; blank is null
pub(crate) fn infer_cell(text: &str) -> CellValue {
    if text.is_empty() {
        return CellValue::Null;
    }
    if let Ok(v) = text.parse::<i64>() {
        return CellValue::Int(v);
    }
    if let Ok(v) = text.parse::<f64>() {
        return CellValue::Float(v);
    }
    match text {
        "true" | "True" | "TRUE" => CellValue::Bool(true),
        "false" | "False" | "FALSE" => CellValue::Bool(false),
        _ => CellValue::Text(text.to_string()),
    }
}
