//! HTTP client for the remote document store
//!
//! Wraps the four Graph endpoints the pipeline needs: children listing,
//! folder resolution by path, asynchronous item copy, and file download.
//! Every call is a single blocking round trip from the pipeline's point of
//! view; no retries happen here.

use crate::auth::TokenProvider;
use crate::config::GraphConfig;
use crate::error::{IngestError, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// One entry of a folder listing
#[derive(Debug, Clone, Deserialize)]
pub struct DriveItem {
    pub id: String,
    pub name: String,

    /// Present when the item is a file
    #[serde(default)]
    pub file: Option<serde_json::Value>,

    /// Present when the item is a folder
    #[serde(default)]
    pub folder: Option<serde_json::Value>,

    #[serde(rename = "@microsoft.graph.downloadUrl", default)]
    pub download_url: Option<String>,

    #[serde(rename = "parentReference", default)]
    pub parent_reference: Option<ParentReference>,
}

impl DriveItem {
    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn is_folder(&self) -> bool {
        self.folder.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParentReference {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListChildrenResponse {
    value: Vec<DriveItem>,
}

#[derive(Debug, Deserialize)]
struct FolderResponse {
    id: String,
}

/// Client for the document store endpoints
pub struct GraphClient {
    http: Client,
    config: GraphConfig,
    token: Arc<TokenProvider>,
}

impl GraphClient {
    pub fn new(config: GraphConfig, token: Arc<TokenProvider>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(GraphClient {
            http,
            config,
            token,
        })
    }

    /// List the immediate children of a folder path
    pub async fn list_children(&self, folder_path: &str) -> Result<Vec<DriveItem>> {
        self.list_children_url(&self.config.children_url(folder_path))
            .await
    }

    /// List the immediate children of an item by id
    pub async fn list_children_by_id(&self, item_id: &str) -> Result<Vec<DriveItem>> {
        self.list_children_url(&self.config.children_by_id_url(item_id))
            .await
    }

    async fn list_children_url(&self, url: &str) -> Result<Vec<DriveItem>> {
        debug!(url = %url, "Listing folder children");

        let token = self.token.bearer().await?;
        let response = self.http.get(url).bearer_auth(token).send().await?;

        if response.status() != StatusCode::OK {
            return Err(IngestError::Transport(format!(
                "Folder listing failed: HTTP {}",
                response.status()
            )));
        }

        let body: ListChildrenResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Transport(format!("Malformed listing response: {}", e)))?;

        Ok(body.value)
    }

    /// Resolve a folder path to its item id
    pub async fn resolve_folder(&self, folder_path: &str) -> Result<String> {
        let url = self.config.folder_url(folder_path);
        debug!(url = %url, "Resolving folder path");

        let token = self.token.bearer().await?;
        let response = self.http.get(&url).bearer_auth(token).send().await?;

        if response.status() != StatusCode::OK {
            return Err(IngestError::NotFound(format!(
                "Folder not found: {} (HTTP {})",
                folder_path,
                response.status()
            )));
        }

        let body: FolderResponse = response
            .json()
            .await
            .map_err(|e| IngestError::Transport(format!("Malformed folder response: {}", e)))?;

        Ok(body.id)
    }

    /// Request an asynchronous copy of an item into a destination folder
    ///
    /// The store answers 202 when the copy is accepted; completion must be
    /// observed separately by listing the destination folder.
    pub async fn copy_item(
        &self,
        item_id: &str,
        destination_folder_id: &str,
        new_name: &str,
    ) -> Result<()> {
        let url = self.config.copy_url(item_id);
        debug!(url = %url, new_name = %new_name, "Requesting item copy");

        let body = json!({
            "parentReference": { "id": destination_folder_id },
            "name": new_name,
        });

        let token = self.token.bearer().await?;
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(IngestError::Transport(format!(
                "Copy request failed: HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Download file content from an item's download URL
    pub async fn download(&self, download_url: &str) -> Result<Vec<u8>> {
        debug!(url = %download_url, "Downloading file");

        let token = self.token.bearer().await?;
        let response = self
            .http
            .get(download_url)
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(IngestError::Transport(format!(
                "Download failed: HTTP {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
