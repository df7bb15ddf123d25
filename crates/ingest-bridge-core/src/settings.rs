// SPDX-License-Identifier: AGPL-3.0
// Ingest Bridge Core - Client settings
//
// Where the transfer service lives and how long to wait for it.
// Session configuration (endpoints, credentials, columns) is never stored;
// these settings only describe the process environment.

use crate::types::AppError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "INGEST_BRIDGE_API_URL";

/// Environment variable overriding the request timeout (milliseconds)
pub const ENV_TIMEOUT_MS: &str = "INGEST_BRIDGE_TIMEOUT_MS";

/// Settings for talking to the transfer service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Base URL of the transfer service (default: http://127.0.0.1:8000)
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Timeout for discovery requests in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Timeout for establishing a connection in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Optional timeout for transfer requests. None means wait for the service.
    #[serde(default)]
    pub transfer_timeout_ms: Option<u64>,
    /// Maximum number of sample rows kept from a preview
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

fn default_preview_rows() -> usize {
    100
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            transfer_timeout_ms: None,
            preview_rows: default_preview_rows(),
        }
    }
}

impl ClientSettings {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL) {
            tracing::info!("API base URL overridden from environment: {}", url);
            self.api_base_url = url;
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.request_timeout_ms = raw.trim().parse().map_err(|_| {
                AppError::InvalidConfig(format!("{} is not a number: {:?}", ENV_TIMEOUT_MS, raw))
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the HTTP client cannot work with
    pub fn validate(&self) -> Result<(), AppError> {
        let url = self.api_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::InvalidConfig(format!(
                "API base URL must start with http:// or https://, got {:?}",
                self.api_base_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::InvalidConfig(
                "Request timeout must be greater than zero".to_string(),
            ));
        }
        if self.transfer_timeout_ms == Some(0) {
            return Err(AppError::InvalidConfig(
                "Transfer timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Join an API path onto the base URL
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn transfer_timeout(&self) -> Option<Duration> {
        self.transfer_timeout_ms.map(Duration::from_millis)
    }
}
