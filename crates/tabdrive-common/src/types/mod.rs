//! Shared domain types

pub mod table;

pub use table::{CellValue, Table, TableError};
