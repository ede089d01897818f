//! Remote tabular file ingestion
//!
//! This crate turns pattern-matched files on a Microsoft Graph drive into
//! profiled in-memory tables. The pieces compose into a single pipeline:
//!
//! - [`config`]: environment-driven connection settings and URL building
//! - [`auth`]: client-credentials token acquisition with caching
//! - [`graph`]: thin typed client over the drive REST endpoints
//! - [`locate`]: recursive folder search with full-name regex matching
//! - [`backup`]: timestamped copy-aside with completion polling
//! - [`parse`]: CSV and spreadsheet parsing, including a repair chain for
//!   corrupted workbooks
//! - [`profile`]: per-column type inference and quality statistics
//! - [`pipeline`]: the orchestrator tying the stages together
//!
//! # Example
//!
//! ```rust,ignore
//! use tabdrive_ingest::{GraphConfig, IngestionParameters, IngestionPipeline};
//!
//! let pipeline = IngestionPipeline::new(GraphConfig::from_env()?)?;
//! let params = IngestionParameters::new("Reports/Monthly", r"sales_\d{4}\.xlsx");
//! let output = pipeline.ingest(&params).await?;
//! println!("{} rows, {} columns", output.table.row_count(), output.columns.len());
//! ```

pub mod auth;
pub mod backup;
pub mod config;
pub mod error;
pub mod graph;
pub mod locate;
pub mod parse;
pub mod pipeline;
pub mod profile;

pub use auth::TokenProvider;
pub use backup::{BackupOperator, BackupRecord};
pub use config::GraphConfig;
pub use error::{IngestError, Result};
pub use graph::{DriveItem, GraphClient};
pub use locate::{FileHandle, Locator};
pub use parse::{Delimiter, FileFormat, ParseOptions};
pub use pipeline::{IngestOutput, IngestionParameters, IngestionPipeline};
pub use profile::{ColumnProfile, InferredType};
