//! In-memory tabular model
//!
//! A [`Table`] is an ordered sequence of named columns, each an ordered
//! sequence of [`CellValue`]s. All columns always have the same length;
//! the invariant is enforced by construction (`push_row` pads short rows
//! and truncates long ones).

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// Errors raised by table construction and combination
#[derive(Error, Debug)]
pub enum TableError {
    #[error("column count mismatch when merging tables: expected {expected}, got {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },
}

/// A single typed cell value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Text(String),
    Null,
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Int(v) => Some(*v as f64),
            CellValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Storage type label for this value
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "int64",
            CellValue::Float(_) => "float64",
            CellValue::Bool(_) => "bool",
            CellValue::DateTime(_) => "datetime64",
            CellValue::Text(_) => "object",
            CellValue::Null => "null",
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(v) => write!(f, "{}", v),
            CellValue::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Text(v) => write!(f, "{}", v),
            CellValue::Null => Ok(()),
        }
    }
}

/// Ordered, named columns of typed cells
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<CellValue>>,
}

impl Table {
    /// Create an empty table with the given column names
    pub fn new(names: Vec<String>) -> Self {
        let columns = names.iter().map(|_| Vec::new()).collect();
        Self { names, columns }
    }

    /// Create a table from row-major data
    ///
    /// Rows shorter than the header are padded with nulls, longer rows are
    /// truncated, so the equal-column-length invariant always holds.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(names);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    /// Append one row, padding or truncating it to the column count
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        let width = self.columns.len();
        let mut cells = row.into_iter();
        for column in self.columns.iter_mut().take(width) {
            column.push(cells.next().unwrap_or(CellValue::Null));
        }
    }

    /// Append a column where every row holds the same value
    pub fn push_constant_column(&mut self, name: impl Into<String>, value: CellValue) {
        let rows = self.row_count();
        self.names.push(name.into());
        self.columns.push(vec![value; rows]);
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Column cells by position
    pub fn column(&self, index: usize) -> Option<&[CellValue]> {
        self.columns.get(index).map(|c| c.as_slice())
    }

    /// Column cells by name (first occurrence for duplicate names)
    pub fn column_by_name(&self, name: &str) -> Option<&[CellValue]> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.column(i))
    }

    /// Iterate columns as (name, cells) pairs in column order
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[CellValue])> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.columns.iter().map(|c| c.as_slice()))
    }

    /// Keep only the first `rows` rows (preview truncation)
    pub fn truncate(&mut self, rows: usize) {
        for column in &mut self.columns {
            column.truncate(rows);
        }
    }

    /// Concatenate tables positionally
    ///
    /// Column names come from the first table; no column-name union is
    /// performed. Tables with a different column count are rejected.
    pub fn concat(tables: Vec<Table>) -> Result<Table, TableError> {
        let mut iter = tables.into_iter();
        let mut merged = match iter.next() {
            Some(first) => first,
            None => return Ok(Table::new(Vec::new())),
        };

        for table in iter {
            if table.column_count() != merged.column_count() {
                return Err(TableError::ColumnCountMismatch {
                    expected: merged.column_count(),
                    actual: table.column_count(),
                });
            }
            for (target, source) in merged.columns.iter_mut().zip(table.columns) {
                target.extend(source);
            }
        }

        Ok(merged)
    }
}
