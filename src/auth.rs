//! OAuth2 client-credentials token retrieval for the DMP registry.
//!
//! The token is fetched lazily on first use and cached for the rest of the
//! run. A 401 from the registry invalidates it so the next call
//! re-authenticates; nothing is retried within a call.

use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{truncate, Result, Service, SyncError};

/// A bearer (or other type) token from the token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl AccessToken {
    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Fetches and caches a client-credentials token.
pub struct TokenProvider {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    user_agent: String,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenProvider {
    pub fn new(
        http: reqwest::Client,
        token_url: String,
        client_id: String,
        client_secret: String,
        user_agent: String,
    ) -> Self {
        Self {
            http,
            token_url,
            client_id,
            client_secret,
            user_agent,
            cached: Mutex::new(None),
        }
    }

    /// The cached token, fetching one if none is held.
    pub async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }
        let token = self.fetch().await?;
        *cached = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    async fn fetch(&self) -> Result<AccessToken> {
        tracing::debug!(url = %self.token_url, "requesting registry access token");

        let resp = self
            .http
            .post(&self.token_url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| SyncError::transport(Service::TokenEndpoint, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| SyncError::transport(Service::TokenEndpoint, e))?;

        if !status.is_success() {
            let parsed: serde_json::Value =
                serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
            let detail = parsed["error_description"]
                .as_str()
                .or_else(|| parsed["error"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| truncate(&body, 200));
            return Err(SyncError::AuthenticationFailure {
                status: status.as_u16(),
                detail,
            });
        }

        serde_json::from_str(&body).map_err(|e| SyncError::malformed(Service::TokenEndpoint, e))
    }
}
