//! Privileged record store client.
//!
//! Credentials come from configuration once, at startup, and are passed in
//! explicitly. A `DataClient` is built per guarded request; building it fails
//! when the privileged key or base URL is absent.

use crate::config::{Config, ConfigError};
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

const DATA_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Record store request failure.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("record store request failed: {0}")]
    Transport(String),

    #[error("record store returned status {0}")]
    Status(u16),

    #[error("record store response invalid: {0}")]
    InvalidResponse(String),
}

/// Trusted credentials for the record store, shared by every request.
#[derive(Clone)]
pub struct PrivilegedCredentials {
    base_url: Option<String>,
    service_role_key: Option<SecretString>,
    http_client: Client,
}

impl PrivilegedCredentials {
    pub fn new(base_url: Option<String>, service_role_key: Option<SecretString>) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(DATA_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "sg.services.data", error = %e, "Failed to build HTTP client with custom config, using defaults");
                Client::new()
            });

        Self {
            base_url,
            service_role_key,
            http_client,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Some(config.data_base_url.clone()),
            config.service_role_key.clone(),
        )
    }
}

/// Custom Debug implementation that redacts the service key.
impl fmt::Debug for PrivilegedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivilegedCredentials")
            .field("base_url", &self.base_url)
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Record store client authenticated with the privileged key.
#[derive(Clone)]
pub struct DataClient {
    rest_url: String,
    service_role_key: SecretString,
    http_client: Client,
}

impl DataClient {
    /// Build a client from trusted credentials.
    ///
    /// # Errors
    ///
    /// `ConfigError::MissingCredential` if the base URL or the privileged key
    /// is absent or blank.
    pub fn new(credentials: &PrivilegedCredentials) -> Result<Self, ConfigError> {
        let base_url = credentials
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingCredential("DATA_BASE_URL"))?;

        let service_role_key = credentials
            .service_role_key
            .clone()
            .filter(|key| !key.expose_secret().trim().is_empty())
            .ok_or(ConfigError::MissingCredential("AUTH_SERVICE_ROLE_KEY"))?;

        Ok(Self {
            rest_url: format!("{}/rest/v1", base_url.trim_end_matches('/')),
            service_role_key,
            http_client: credentials.http_client.clone(),
        })
    }

    /// Fetch rows from `table`.
    ///
    /// Filters are passed through as query parameters, e.g.
    /// `("id", "eq.u1")`.
    #[instrument(skip(self, filters), name = "sg.services.data.select")]
    pub async fn select(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<Value>, DataError> {
        let url = format!("{}/{}", self.rest_url, table);

        let response = self
            .http_client
            .get(&url)
            .query(filters)
            .header("apikey", self.service_role_key.expose_secret())
            .bearer_auth(self.service_role_key.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DataError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(target: "sg.services.data", status = %status, "Record store rejected request");
            return Err(DataError::Status(status.as_u16()));
        }

        response
            .json::<Vec<Value>>()
            .await
            .map_err(|e| DataError::InvalidResponse(e.to_string()))
    }
}

/// Custom Debug implementation that redacts the service key.
impl fmt::Debug for DataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataClient")
            .field("rest_url", &self.rest_url)
            .field("service_role_key", &"[REDACTED]")
            .finish()
    }
}
