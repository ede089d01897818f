//! Tabdrive Common Library
//!
//! Shared types and utilities for the tabdrive workspace.
//!
//! # Overview
//!
//! This crate provides functionality used across all tabdrive workspace
//! members:
//!
//! - **Types**: The in-memory tabular model (`Table`, `CellValue`)
//! - **Logging**: Centralized tracing subscriber configuration
//!
//! # Example
//!
//! ```
//! use tabdrive_common::types::{CellValue, Table};
//!
//! let mut table = Table::new(vec!["id".to_string(), "name".to_string()]);
//! table.push_row(vec![CellValue::Int(1), CellValue::Text("alpha".into())]);
//! assert_eq!(table.row_count(), 1);
//! ```

pub mod logging;
pub mod types;

// Re-export commonly used types
pub use types::{CellValue, Table};
