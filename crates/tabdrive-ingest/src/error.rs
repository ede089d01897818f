//! Error types for tabular ingestion
//!
//! Each pipeline stage raises its own classified error and the pipeline
//! propagates the first failure verbatim, so callers always see which
//! stage gave up and why.

use tabdrive_common::types::TableError;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Classified error type for the ingestion pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    /// No file matched the pattern, or a folder path did not resolve
    #[error("Not found: {0}")]
    NotFound(String),

    /// A remote call (listing, download, copy, token exchange) did not succeed
    #[error("Transport error: {0}")]
    Transport(String),

    /// File extension outside the supported set
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Every parse strategy was exhausted
    #[error("Cannot read '{file}': {detail}")]
    UnreadableFile { file: String, detail: String },

    /// A requested backup copy was accepted but never confirmed
    #[error("Backup '{backup_name}' not confirmed after {attempts} attempts")]
    BackupVerification { backup_name: String, attempts: u32 },

    /// Caller-supplied parameters failed validation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Positional concatenation of multi-file results failed
    #[error("Merge error: {0}")]
    Merge(#[from] TableError),

    /// Spreadsheet reader failure inside a parse strategy
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(err.to_string())
    }
}
