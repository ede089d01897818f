//! Backup copies of source files before reading
//!
//! The remote copy operation is asynchronous: the store accepts the request
//! with 202 and materializes the copy later. The operator therefore polls
//! the destination folder until the backup appears, and aborts the whole
//! ingestion when it cannot confirm one — downstream consumers assume a
//! recovery copy exists whenever the backup flag was set.

use crate::config::GraphConfig;
use crate::error::{IngestError, Result};
use crate::graph::GraphClient;
use crate::locate::FileHandle;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Outcome of a confirmed backup
#[derive(Debug, Clone)]
pub struct BackupRecord {
    pub backup_name: String,
    pub success: bool,
}

/// Copies source files to a backup folder with verified completion
pub struct BackupOperator {
    client: Arc<GraphClient>,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl BackupOperator {
    pub fn new(client: Arc<GraphClient>, config: &GraphConfig) -> Self {
        BackupOperator {
            client,
            poll_attempts: config.backup_poll_attempts,
            poll_interval: Duration::from_secs(config.backup_poll_interval_secs),
        }
    }

    /// Copy the file into the destination folder and wait for confirmation
    ///
    /// Fails before any copy call when the destination folder does not
    /// resolve. After an accepted copy, polls the destination listing up to
    /// the configured attempt count and raises `BackupVerification` when the
    /// backup never appears.
    pub async fn backup(
        &self,
        handle: &FileHandle,
        destination_folder_path: &str,
    ) -> Result<BackupRecord> {
        let destination_id = self.client.resolve_folder(destination_folder_path).await?;

        let backup_name = backup_name(&handle.name, Utc::now());
        info!(
            file = %handle.name,
            backup = %backup_name,
            destination = %destination_folder_path,
            "Creating backup copy"
        );

        self.client
            .copy_item(&handle.id, &destination_id, &backup_name)
            .await?;

        for attempt in 1..=self.poll_attempts {
            let items = self.client.list_children_by_id(&destination_id).await;

            if let Ok(items) = items {
                if items.iter().any(|item| item.name == backup_name) {
                    info!(backup = %backup_name, attempt, "Backup confirmed");
                    return Ok(BackupRecord {
                        backup_name,
                        success: true,
                    });
                }
            }

            debug!(backup = %backup_name, attempt, "Backup not visible yet");
            if attempt < self.poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        Err(IngestError::BackupVerification {
            backup_name,
            attempts: self.poll_attempts,
        })
    }
}

/// Backup file name: stem, UTC+7 timestamp, "_Backup" suffix, extension
fn backup_name(file_name: &str, now_utc: DateTime<Utc>) -> String {
    let timestamp = (now_utc + ChronoDuration::hours(7)).format("%Y%m%d_%H%M%S");

    match file_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{}_{}_Backup.{}", stem, timestamp, extension),
        None => format!("{}_{}_Backup", file_name, timestamp),
    }
}
