//! Bearer token acquisition and caching
//!
//! Tokens come from a client-credential exchange and are cached until a
//! caller invalidates them. The provider is an explicit capability handed
//! to the components that need it; there is no process-wide token state.

use crate::config::GraphConfig;
use crate::error::{IngestError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Cached client-credential token source
pub struct TokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    scope: String,
    cache: RwLock<Option<String>>,
}

impl TokenProvider {
    pub fn new(config: &GraphConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(TokenProvider {
            http,
            token_url: config.token_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            cache: RwLock::new(None),
        })
    }

    /// Current bearer token, acquiring one on first use
    pub async fn bearer(&self) -> Result<String> {
        if let Some(token) = self.cache.read().await.clone() {
            return Ok(token);
        }

        let mut cache = self.cache.write().await;
        // another caller may have acquired while we waited for the lock
        if let Some(token) = cache.clone() {
            return Ok(token);
        }

        let token = self.acquire().await?;
        *cache = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token so the next call reacquires
    pub async fn invalidate(&self) {
        debug!("Invalidating cached bearer token");
        *self.cache.write().await = None;
    }

    async fn acquire(&self) -> Result<String> {
        debug!(url = %self.token_url, "Acquiring bearer token");

        let form = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
            ("scope", self.scope.as_str()),
        ];

        let response = self.http.post(&self.token_url).form(&form).send().await?;

        if !response.status().is_success() {
            return Err(IngestError::Transport(format!(
                "Token exchange failed: HTTP {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            IngestError::Transport(format!("Token response missing access_token: {}", e))
        })?;

        Ok(body.access_token)
    }
}
