//! End-to-end ingestion orchestration
//!
//! Wires the drive client, locator, backup operator, parser, and profiler
//! into a single call: validate parameters, find every matching remote
//! file, optionally back each one up, download and parse it, merge the
//! results, and profile the merged columns. Any stage failure aborts the
//! whole run; partial results are never returned.

use crate::backup::{BackupOperator, BackupRecord};
use crate::config::GraphConfig;
use crate::error::{IngestError, Result};
use crate::graph::GraphClient;
use crate::locate::{FileHandle, Locator};
use crate::parse::{self, Delimiter, ParseOptions};
use crate::profile::{self, ColumnProfile};
use crate::TokenProvider;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tabdrive_common::types::{CellValue, Table};
use tracing::info;

/// Name of the provenance column appended when several files merge
const SOURCE_COLUMN: &str = "Source";

/// Label used in the provenance column for files found at the search root
const ROOT_SOURCE: &str = "Root";

/// One ingestion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionParameters {
    /// Drive-relative folder to search, recursively
    pub folder_path: String,

    /// Regex matched against the entire file name
    pub file_pattern: String,

    /// Worksheet to read; None selects the first sheet
    #[serde(default)]
    pub sheet_name: Option<String>,

    /// 0-based physical row holding the column names
    #[serde(default)]
    pub header_row: usize,

    /// CSV delimiter; required only for CSV files
    #[serde(default)]
    pub delimiter: Option<Delimiter>,

    /// Copy each matched file aside before reading it
    #[serde(default)]
    pub backup: bool,

    /// Destination folder for backups; required when `backup` is set
    #[serde(default)]
    pub backup_folder_path: Option<String>,
}

impl IngestionParameters {
    pub fn new(folder_path: impl Into<String>, file_pattern: impl Into<String>) -> Self {
        IngestionParameters {
            folder_path: folder_path.into(),
            file_pattern: file_pattern.into(),
            sheet_name: None,
            header_row: 0,
            delimiter: None,
            backup: false,
            backup_folder_path: None,
        }
    }

    /// Reject inconsistent parameter combinations before any remote call
    pub fn validate(&self) -> Result<()> {
        if self.folder_path.trim().is_empty() {
            return Err(IngestError::InvalidParameter(
                "folder_path must not be empty".to_string(),
            ));
        }
        if self.file_pattern.trim().is_empty() {
            return Err(IngestError::InvalidParameter(
                "file_pattern must not be empty".to_string(),
            ));
        }
        if let Err(e) = regex::Regex::new(&self.file_pattern) {
            return Err(IngestError::InvalidParameter(format!(
                "file_pattern is not a valid regular expression: {}",
                e
            )));
        }
        if self.backup && self.backup_folder_path.is_none() {
            return Err(IngestError::InvalidParameter(
                "backup_folder_path is required when backup is enabled".to_string(),
            ));
        }
        Ok(())
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            sheet_name: self.sheet_name.clone(),
            header_row: self.header_row,
            delimiter: self.delimiter,
        }
    }
}

/// Result of a completed ingestion run
#[derive(Debug)]
pub struct IngestOutput {
    /// Merged table across all matched files
    pub table: Table,

    /// Per-column statistics of the merged table
    pub columns: HashMap<String, ColumnProfile>,

    /// The matched files, in processing order
    pub files: Vec<FileHandle>,

    /// Backup confirmations, one per file, when backups were requested
    pub backups: Vec<BackupRecord>,
}

/// The assembled ingestion pipeline
pub struct IngestionPipeline {
    client: Arc<GraphClient>,
    locator: Locator,
    backup: BackupOperator,
}

impl IngestionPipeline {
    /// Build the pipeline from configuration
    pub fn new(config: GraphConfig) -> Result<Self> {
        config.validate()?;

        let token = Arc::new(TokenProvider::new(&config)?);
        let client = Arc::new(GraphClient::new(config.clone(), token)?);

        Ok(IngestionPipeline {
            locator: Locator::new(Arc::clone(&client)),
            backup: BackupOperator::new(Arc::clone(&client), &config),
            client,
        })
    }

    /// Run one ingestion end to end
    pub async fn ingest(&self, params: &IngestionParameters) -> Result<IngestOutput> {
        params.validate()?;

        info!(
            folder = %params.folder_path,
            pattern = %params.file_pattern,
            backup = params.backup,
            "Starting ingestion"
        );

        let handles = self
            .locator
            .locate_all(&params.folder_path, &params.file_pattern)
            .await?;

        let options = params.parse_options();
        let mut tables = Vec::with_capacity(handles.len());
        let mut backups = Vec::new();

        for handle in &handles {
            if params.backup {
                // validate() guarantees the destination is present
                if let Some(destination) = &params.backup_folder_path {
                    backups.push(self.backup.backup(handle, destination).await?);
                }
            }

            let bytes = self.client.download(&handle.download_url).await?;
            let mut table = parse::parse(&bytes, &handle.name, &options)?;

            if handles.len() > 1 {
                let source = handle
                    .source_folder
                    .clone()
                    .unwrap_or_else(|| ROOT_SOURCE.to_string());
                table.push_constant_column(SOURCE_COLUMN, CellValue::Text(source));
            }

            tables.push(table);
        }

        let table = Table::concat(tables)?;
        let columns = profile::profile(&table);

        info!(
            files = handles.len(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Ingestion complete"
        );

        Ok(IngestOutput {
            table,
            columns,
            files: handles,
            backups,
        })
    }
}
