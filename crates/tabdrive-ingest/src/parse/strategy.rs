//! Ordered fallback chain for reading damaged spreadsheets
//!
//! Strategies run from the fastest, most standards-compliant reader down
//! to a last-resort manual extraction. Each strategy sees a fresh copy of
//! the file bytes, so a destructive attempt never poisons the next one.
//! The file is unreadable only when every strategy has failed.

use crate::error::{IngestError, Result};
use crate::parse::raw::{read_raw, Strictness};
use crate::parse::repair::repair_styles;
use crate::parse::sheet::{read_xls, read_xlsx};
use crate::parse::ParseOptions;
use tabdrive_common::types::Table;
use tracing::{debug, warn};

/// One attempt in the repair chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Standards-compliant XLSX reader
    Standard,
    /// Raw cell extraction that never opens the style part
    IgnoreStyles,
    /// Legacy binary XLS reader
    Legacy,
    /// Rewrite the corrupt style table, then retry the standard reader
    RepairStyles,
    /// Lenient raw extraction that tolerates broken archive parts
    ManualExtraction,
}

impl ParseStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ParseStrategy::Standard => "standard",
            ParseStrategy::IgnoreStyles => "ignore-styles",
            ParseStrategy::Legacy => "legacy-xls",
            ParseStrategy::RepairStyles => "repair-styles",
            ParseStrategy::ManualExtraction => "manual-extraction",
        }
    }

    fn run(&self, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
        match self {
            ParseStrategy::Standard => read_xlsx(bytes, options),
            ParseStrategy::IgnoreStyles => read_raw(bytes, options, Strictness::Strict),
            ParseStrategy::Legacy => read_xls(bytes, options),
            ParseStrategy::RepairStyles => {
                let repaired = repair_styles(bytes)?;
                read_xlsx(&repaired, options)
            },
            ParseStrategy::ManualExtraction => read_raw(bytes, options, Strictness::Lenient),
        }
    }
}

const CHAIN: [ParseStrategy; 5] = [
    ParseStrategy::Standard,
    ParseStrategy::IgnoreStyles,
    ParseStrategy::Legacy,
    ParseStrategy::RepairStyles,
    ParseStrategy::ManualExtraction,
];

/// Read a spreadsheet, walking the repair chain until one strategy succeeds
pub fn read_spreadsheet(file_name: &str, bytes: &[u8], options: &ParseOptions) -> Result<Table> {
    let mut failures: Vec<String> = Vec::new();

    for strategy in CHAIN {
        debug!(file = %file_name, strategy = strategy.label(), "attempting spreadsheet read");
        match strategy.run(bytes, options) {
            Ok(table) => {
                if !failures.is_empty() {
                    warn!(
                        file = %file_name,
                        strategy = strategy.label(),
                        failed_attempts = failures.len(),
                        "spreadsheet read recovered after failed attempts"
                    );
                }
                return Ok(table);
            },
            Err(e) => {
                debug!(file = %file_name, strategy = strategy.label(), error = %e, "strategy failed");
                failures.push(format!("{}: {}", strategy.label(), e));
            },
        }
    }

    Err(IngestError::UnreadableFile {
        file: file_name.to_string(),
        detail: failures.join("; "),
    })
}
