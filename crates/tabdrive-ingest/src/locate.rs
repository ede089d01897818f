//! Remote file location
//!
//! Resolves a folder path plus a file-name pattern into concrete file
//! handles by walking the remote folder tree. Files found anywhere below a
//! top-level subfolder are tagged with that subfolder's name so merged
//! multi-file results can carry provenance.

use crate::error::{IngestError, Result};
use crate::graph::GraphClient;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolved reference to one remote file
#[derive(Debug, Clone)]
pub struct FileHandle {
    pub id: String,
    pub name: String,
    pub download_url: String,
    pub parent_folder_id: Option<String>,

    /// Top-level subfolder the file was first reached through, or None for
    /// files found directly in the searched folder
    pub source_folder: Option<String>,
}

/// Locates files in the remote folder tree
pub struct Locator {
    client: Arc<GraphClient>,
}

impl Locator {
    pub fn new(client: Arc<GraphClient>) -> Self {
        Locator { client }
    }

    /// Resolve a single file for the metadata-lookup contract
    pub async fn locate(&self, folder_path: &str, pattern: &str) -> Result<FileHandle> {
        let mut matches = self.locate_all(folder_path, pattern).await?;
        Ok(matches.remove(0))
    }

    /// Resolve every file matching the pattern
    ///
    /// The pattern is a full-string regular expression match against the
    /// file name, not a substring search. When several matches are found
    /// and all of them sit directly in the searched folder, only the first
    /// in listing order is kept; legacy callers rely on single-file root
    /// lookups narrowing silently instead of erroring.
    pub async fn locate_all(&self, folder_path: &str, pattern: &str) -> Result<Vec<FileHandle>> {
        let regex = full_match_regex(pattern)?;

        let all_files = self.list_all_files(folder_path).await?;
        debug!(
            folder = %folder_path,
            files = all_files.len(),
            "Enumerated remote folder tree"
        );

        let mut matches: Vec<FileHandle> = all_files
            .into_iter()
            .filter(|f| regex.is_match(&f.name))
            .collect();

        if matches.is_empty() {
            return Err(IngestError::NotFound(format!(
                "No files matched pattern '{}' in folder '{}'",
                pattern, folder_path
            )));
        }

        let root_only = matches.iter().all(|f| f.source_folder.is_none());
        if root_only && matches.len() > 1 {
            warn!(
                pattern = %pattern,
                kept = %matches[0].name,
                discarded = matches.len() - 1,
                "Multiple root-level files matched; keeping first in listing order"
            );
            matches.truncate(1);
        }

        info!(
            pattern = %pattern,
            matched = matches.len(),
            first = %matches[0].name,
            "Located remote files"
        );

        Ok(matches)
    }

    /// Collect every file in the folder and its subfolders, depth first
    async fn list_all_files(&self, folder_path: &str) -> Result<Vec<FileHandle>> {
        let mut files = Vec::new();
        let mut stack: Vec<(String, Option<String>)> = vec![(folder_path.to_string(), None)];

        while let Some((path, top_folder)) = stack.pop() {
            let items = self.client.list_children(&path).await?;

            let mut subfolders = Vec::new();
            for item in items {
                if item.is_file() {
                    files.push(FileHandle {
                        id: item.id,
                        name: item.name,
                        download_url: item.download_url.unwrap_or_default(),
                        parent_folder_id: item.parent_reference.and_then(|p| p.id),
                        source_folder: top_folder.clone(),
                    });
                } else if item.is_folder() {
                    let sub_path = format!("{}/{}", path, item.name);
                    // files below keep the first top-level subfolder tag
                    let tag = top_folder.clone().or(Some(item.name));
                    subfolders.push((sub_path, tag));
                }
            }

            // reversed so subfolders are visited in listing order
            stack.extend(subfolders.into_iter().rev());
        }

        Ok(files)
    }
}

/// Compile a pattern that must match the entire file name
fn full_match_regex(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{})$", pattern))
        .map_err(|e| IngestError::InvalidParameter(format!("Invalid file pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_not_substring() {
        let regex = full_match_regex("Online Retail.xlsx").unwrap();
        assert!(regex.is_match("Online Retail.xlsx"));
        assert!(!regex.is_match("Online Retail.xlsx.bak"));
        assert!(!regex.is_match("Copy of Online Retail.xlsx"));
    }

    #[test]
    fn test_full_match_with_metacharacters() {
        let regex = full_match_regex(r"sales_\d{4}\.csv").unwrap();
        assert!(regex.is_match("sales_2026.csv"));
        assert!(!regex.is_match("sales_2026.csv.old"));
        assert!(!regex.is_match("sales_26.csv"));
    }

    #[test]
    fn test_invalid_pattern_is_parameter_error() {
        let err = full_match_regex("sales[").unwrap_err();
        assert!(matches!(err, IngestError::InvalidParameter(_)));
    }
}
