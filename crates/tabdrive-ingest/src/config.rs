//! Remote document store configuration

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the Graph-style document store API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Directory tenant for the client-credential token exchange
    pub tenant_id: String,

    /// Application (client) id
    pub client_id: String,

    /// Application client secret
    pub client_secret: String,

    /// OAuth scope requested with the token
    pub scope: String,

    /// Site containing the document drive
    pub site_id: String,

    /// Drive holding the folder tree
    pub drive_id: String,

    /// Base URL of the document store API
    pub graph_base_url: String,

    /// Base URL of the token endpoint host
    pub login_base_url: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// Maximum backup-verification polling attempts
    pub backup_poll_attempts: u32,

    /// Pause between backup-verification polls, in seconds
    pub backup_poll_interval_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            tenant_id: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            scope: "https://graph.microsoft.com/.default".to_string(),
            site_id: String::new(),
            drive_id: String::new(),
            graph_base_url: "https://graph.microsoft.com/v1.0".to_string(),
            login_base_url: "https://login.microsoftonline.com".to_string(),
            timeout_secs: 30,
            backup_poll_attempts: 10,
            backup_poll_interval_secs: 3,
        }
    }
}

impl GraphConfig {
    /// Load configuration from the environment
    ///
    /// Reads a `.env` file when present, then the variables `TENANT_ID`,
    /// `APP_ID`, `SECRET_VALUE`, `GRAPH_SCOPE`, `SITE_ID`, `DRIVE_ID`,
    /// `GRAPH_BASE_URL` and `LOGIN_BASE_URL` (`GRAPH_SCOPE` and the base
    /// URLs fall back to defaults).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(v) = std::env::var("TENANT_ID") {
            config.tenant_id = v;
        }
        if let Ok(v) = std::env::var("APP_ID") {
            config.client_id = v;
        }
        if let Ok(v) = std::env::var("SECRET_VALUE") {
            config.client_secret = v;
        }
        if let Ok(v) = std::env::var("GRAPH_SCOPE") {
            config.scope = v;
        }
        if let Ok(v) = std::env::var("SITE_ID") {
            config.site_id = v;
        }
        if let Ok(v) = std::env::var("DRIVE_ID") {
            config.drive_id = v;
        }
        if let Ok(v) = std::env::var("GRAPH_BASE_URL") {
            config.graph_base_url = v;
        }
        if let Ok(v) = std::env::var("LOGIN_BASE_URL") {
            config.login_base_url = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate that every required field is set
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("TENANT_ID", &self.tenant_id),
            ("APP_ID", &self.client_id),
            ("SECRET_VALUE", &self.client_secret),
            ("SITE_ID", &self.site_id),
            ("DRIVE_ID", &self.drive_id),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(IngestError::InvalidParameter(format!(
                "Missing required config: {}",
                missing.join(", ")
            )));
        }

        if self.timeout_secs == 0 {
            return Err(IngestError::InvalidParameter(
                "Timeout must be greater than 0".to_string(),
            ));
        }

        if self.backup_poll_attempts == 0 {
            return Err(IngestError::InvalidParameter(
                "Backup poll attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// URL listing the children of a folder path
    pub fn children_url(&self, folder_path: &str) -> String {
        format!(
            "{}/sites/{}/drives/{}/root:/{}:/children",
            self.graph_base_url, self.site_id, self.drive_id, folder_path
        )
    }

    /// URL listing the children of an item by id
    pub fn children_by_id_url(&self, item_id: &str) -> String {
        format!(
            "{}/sites/{}/drives/{}/items/{}/children",
            self.graph_base_url, self.site_id, self.drive_id, item_id
        )
    }

    /// URL resolving a folder path to an item
    pub fn folder_url(&self, folder_path: &str) -> String {
        format!(
            "{}/sites/{}/drives/{}/root:/{}",
            self.graph_base_url, self.site_id, self.drive_id, folder_path
        )
    }

    /// URL of the asynchronous copy operation for an item
    pub fn copy_url(&self, item_id: &str) -> String {
        format!(
            "{}/sites/{}/drives/{}/items/{}/copy",
            self.graph_base_url, self.site_id, self.drive_id, item_id
        )
    }

    /// URL of the client-credential token endpoint
    pub fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.login_base_url, self.tenant_id)
    }
}
