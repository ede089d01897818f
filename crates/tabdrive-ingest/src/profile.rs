//! Column-level type inference and quality statistics
//!
//! After a table is parsed, every column gets a profile: the storage
//! dtype, a higher-level inferred type, null counts, distinct counts, and
//! a handful of sample values for eyeballing the data.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tabdrive_common::types::{CellValue, Table};
use tracing::debug;

const SAMPLE_SIZE: usize = 5;

/// High-level semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InferredType {
    Integer,
    Float,
    Boolean,
    Date,
    Text,
}

/// Per-column statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    /// Storage type label ("int64", "float64", "bool", "datetime64", "object")
    pub dtype: String,
    pub inferred_type: InferredType,
    pub null_count: usize,
    /// Share of null cells, in percent, rounded to two decimals
    pub null_percentage: f64,
    /// Distinct non-null values
    pub unique_count: usize,
    /// Up to five non-null values in row order
    pub sample_values: Vec<String>,
}

/// Profile every column of a table
///
/// When two columns share a name, the first occurrence wins; later
/// duplicates are not profiled under that name.
pub fn profile(table: &Table) -> HashMap<String, ColumnProfile> {
    let mut profiles = HashMap::new();

    for (name, cells) in table.iter_columns() {
        if profiles.contains_key(name) {
            continue;
        }
        let column_profile = profile_column(cells);
        debug!(
            column = %name,
            dtype = %column_profile.dtype,
            nulls = column_profile.null_count,
            unique = column_profile.unique_count,
            "profiled column"
        );
        profiles.insert(name.to_string(), column_profile);
    }

    profiles
}

fn profile_column(cells: &[CellValue]) -> ColumnProfile {
    let null_count = cells.iter().filter(|c| c.is_null()).count();
    let null_percentage = if cells.is_empty() {
        0.0
    } else {
        round2(null_count as f64 * 100.0 / cells.len() as f64)
    };

    let non_null: Vec<&CellValue> = cells.iter().filter(|c| !c.is_null()).collect();

    let mut seen = HashSet::new();
    let mut sample_values = Vec::new();
    for cell in &non_null {
        let text = cell.to_string();
        if sample_values.len() < SAMPLE_SIZE {
            sample_values.push(text.clone());
        }
        seen.insert(text);
    }

    let inferred_type = infer_type(&non_null);
    let dtype = storage_dtype(&non_null, inferred_type);

    ColumnProfile {
        dtype,
        inferred_type,
        null_count,
        null_percentage,
        unique_count: seen.len(),
        sample_values,
    }
}

/// Infer the semantic type from the non-null cells of a column
///
/// A column with no non-null cells is text; so is anything mixed.
fn infer_type(non_null: &[&CellValue]) -> InferredType {
    if non_null.is_empty() {
        return InferredType::Text;
    }

    if non_null
        .iter()
        .all(|c| matches!(c, CellValue::Int(_) | CellValue::Float(_)))
    {
        let whole = non_null.iter().all(|c| match c {
            CellValue::Int(_) => true,
            CellValue::Float(v) => v.fract() == 0.0,
            _ => false,
        });
        return if whole {
            InferredType::Integer
        } else {
            InferredType::Float
        };
    }

    if non_null.iter().all(|c| matches!(c, CellValue::Bool(_))) {
        return InferredType::Boolean;
    }

    let all_dates = non_null.iter().all(|c| match c {
        CellValue::DateTime(_) => true,
        CellValue::Text(t) => parse_date(t).is_some(),
        _ => false,
    });
    if all_dates {
        return InferredType::Date;
    }

    InferredType::Text
}

/// Storage dtype label for the column
///
/// Columns mixing integers and floats are stored as float64; any other
/// mixture falls back to object.
fn storage_dtype(non_null: &[&CellValue], inferred: InferredType) -> String {
    let label = match inferred {
        InferredType::Integer => {
            if non_null.iter().all(|c| matches!(c, CellValue::Int(_))) {
                "int64"
            } else {
                "float64"
            }
        },
        InferredType::Float => "float64",
        InferredType::Boolean => "bool",
        InferredType::Date => {
            if non_null.iter().all(|c| matches!(c, CellValue::DateTime(_))) {
                "datetime64"
            } else {
                "object"
            }
        },
        InferredType::Text => "object",
    };
    label.to_string()
}

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y", "%m/%d/%Y"];

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    for format in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table_of(name: &str, cells: Vec<CellValue>) -> Table {
        let mut table = Table::new(vec![name.to_string()]);
        for cell in cells {
            table.push_row(vec![cell]);
        }
        table
    }

    #[test]
    fn test_integer_column() {
        let table = table_of(
            "qty",
            vec![CellValue::Int(1), CellValue::Float(2.0), CellValue::Int(3)],
        );
        let profiles = profile(&table);
        let p = &profiles["qty"];

        assert_eq!(p.inferred_type, InferredType::Integer);
        // an integer column holding float storage widens to float64
        assert_eq!(p.dtype, "float64");
        assert_eq!(p.null_count, 0);
        assert_eq!(p.unique_count, 3);
    }

    #[test]
    fn test_pure_int_storage() {
        let table = table_of("n", vec![CellValue::Int(5), CellValue::Int(5)]);
        let p = &profile(&table)["n"];
        assert_eq!(p.dtype, "int64");
        assert_eq!(p.unique_count, 1);
    }

    #[test]
    fn test_float_column() {
        let table = table_of("price", vec![CellValue::Float(1.25), CellValue::Int(2)]);
        let p = &profile(&table)["price"];
        assert_eq!(p.inferred_type, InferredType::Float);
        assert_eq!(p.dtype, "float64");
    }

    #[test]
    fn test_boolean_column() {
        let table = table_of(
            "active",
            vec![CellValue::Bool(true), CellValue::Null, CellValue::Bool(false)],
        );
        let p = &profile(&table)["active"];
        assert_eq!(p.inferred_type, InferredType::Boolean);
        assert_eq!(p.dtype, "bool");
        assert_eq!(p.null_count, 1);
        assert_eq!(p.null_percentage, 33.33);
    }

    #[test]
    fn test_date_column_from_text() {
        let table = table_of(
            "shipped",
            vec![
                CellValue::Text("2026-01-15".to_string()),
                CellValue::Text("2026-02-01 08:00:00".to_string()),
            ],
        );
        let p = &profile(&table)["shipped"];
        assert_eq!(p.inferred_type, InferredType::Date);
        assert_eq!(p.dtype, "object");
    }

    #[test]
    fn test_native_datetime_column() {
        let dt = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let table = table_of("ts", vec![CellValue::DateTime(dt)]);
        let p = &profile(&table)["ts"];
        assert_eq!(p.inferred_type, InferredType::Date);
        assert_eq!(p.dtype, "datetime64");
    }

    #[test]
    fn test_mixed_column_samples_first_five_non_null() {
        let table = table_of(
            "mixed",
            vec![
                CellValue::Int(10),
                CellValue::Int(20),
                CellValue::Null,
                CellValue::Text("x".to_string()),
                CellValue::Int(30),
                CellValue::Int(40),
                CellValue::Int(50),
                CellValue::Int(60),
            ],
        );
        let p = &profile(&table)["mixed"];

        assert_eq!(p.inferred_type, InferredType::Text);
        assert_eq!(p.dtype, "object");
        assert_eq!(p.sample_values, vec!["10", "20", "x", "30", "40"]);
        assert_eq!(p.unique_count, 7);
    }

    #[test]
    fn test_all_null_column_is_text() {
        let table = table_of("blank", vec![CellValue::Null, CellValue::Null]);
        let p = &profile(&table)["blank"];
        assert_eq!(p.inferred_type, InferredType::Text);
        assert_eq!(p.dtype, "object");
        assert_eq!(p.null_percentage, 100.0);
        assert!(p.sample_values.is_empty());
        assert_eq!(p.unique_count, 0);
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(vec!["a".to_string()]);
        let p = &profile(&table)["a"];
        assert_eq!(p.null_count, 0);
        assert_eq!(p.null_percentage, 0.0);
        assert_eq!(p.inferred_type, InferredType::Text);
    }

    #[test]
    fn test_duplicate_column_names_first_wins() {
        let mut table = Table::new(vec!["id".to_string(), "id".to_string()]);
        table.push_row(vec![CellValue::Int(1), CellValue::Text("a".to_string())]);
        let profiles = profile(&table);

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles["id"].dtype, "int64");
    }
}
