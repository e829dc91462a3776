//! Session Gate configuration.
//!
//! Configuration is loaded from environment variables once at startup and
//! never from request data. Credentials are `SecretString` and every
//! credential field is redacted in Debug output.

use crate::session::locator::{DEFAULT_FALLBACK_MIN_VALUE_LEN, DEFAULT_PROVIDER_PREFIX};
use common::secret::SecretString;
use reqwest::Url;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default server bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default bound on the primary resolver call, in milliseconds.
pub const DEFAULT_PRIMARY_TIMEOUT_MS: u64 = 300;

/// Largest accepted primary resolver bound, in milliseconds.
pub const MAX_PRIMARY_TIMEOUT_MS: u64 = 5_000;

/// Paths the gatekeeper never runs on.
pub const DEFAULT_EXCLUDED_PREFIXES: [&str; 6] = [
    "/static/",
    "/_image",
    "/api/",
    "/favicon.ico",
    "/health",
    "/metrics",
];

/// Session Gate configuration.
#[derive(Clone)]
pub struct Config {
    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Base URL of the issuing authority.
    pub auth_base_url: String,

    /// Public client key for the issuing authority.
    pub auth_anon_key: SecretString,

    /// Privileged key for the record store. Optional here; the data client
    /// refuses to build without it.
    pub service_role_key: Option<SecretString>,

    /// Base URL of the record store (defaults to `auth_base_url`).
    pub data_base_url: String,

    /// Canonical session cookie name shared by every adapter.
    pub session_cookie_name: String,

    /// Provider prefix token for the legacy cookie pattern.
    pub session_cookie_prefix: String,

    /// Legacy cookie values must be longer than this.
    pub fallback_min_value_len: usize,

    /// Bound on the primary resolver call, in milliseconds.
    pub primary_timeout_ms: u64,

    /// Path prefixes the gatekeeper skips.
    pub excluded_prefixes: Vec<String>,
}

/// Custom Debug implementation that redacts credentials.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("auth_base_url", &self.auth_base_url)
            .field("auth_anon_key", &"[REDACTED]")
            .field(
                "service_role_key",
                &self.service_role_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("data_base_url", &self.data_base_url)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_cookie_prefix", &self.session_cookie_prefix)
            .field("fallback_min_value_len", &self.fallback_min_value_len)
            .field("primary_timeout_ms", &self.primary_timeout_ms)
            .field("excluded_prefixes", &self.excluded_prefixes)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid base URL configuration: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid primary resolver timeout configuration: {0}")]
    InvalidPrimaryTimeout(String),

    #[error("Invalid fallback cookie length configuration: {0}")]
    InvalidFallbackLength(String),

    #[error("Missing privileged credential: {0}")]
    MissingCredential(&'static str),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let auth_base_url = non_empty(vars, "AUTH_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_BASE_URL".to_string()))?;
        let auth_url = parse_base_url("AUTH_BASE_URL", &auth_base_url)?;

        let auth_anon_key = non_empty(vars, "AUTH_ANON_KEY")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("AUTH_ANON_KEY".to_string()))?;

        let service_role_key = non_empty(vars, "AUTH_SERVICE_ROLE_KEY").map(SecretString::from);

        let data_base_url = match non_empty(vars, "DATA_BASE_URL") {
            Some(url) => {
                parse_base_url("DATA_BASE_URL", &url)?;
                url
            }
            None => auth_base_url.clone(),
        };

        let bind_address =
            non_empty(vars, "BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let session_cookie_name = non_empty(vars, "SESSION_COOKIE_NAME")
            .unwrap_or_else(|| default_cookie_name(&auth_url));

        let session_cookie_prefix = non_empty(vars, "SESSION_COOKIE_PREFIX")
            .unwrap_or_else(|| DEFAULT_PROVIDER_PREFIX.to_string());

        let fallback_min_value_len =
            if let Some(value_str) = non_empty(vars, "SESSION_FALLBACK_MIN_VALUE_LEN") {
                value_str.parse::<usize>().map_err(|e| {
                    ConfigError::InvalidFallbackLength(format!(
                        "SESSION_FALLBACK_MIN_VALUE_LEN must be a non-negative integer, got '{}': {}",
                        value_str, e
                    ))
                })?
            } else {
                DEFAULT_FALLBACK_MIN_VALUE_LEN
            };

        // Parse primary resolver timeout with validation
        let primary_timeout_ms =
            if let Some(value_str) = non_empty(vars, "PRIMARY_RESOLVER_TIMEOUT_MS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidPrimaryTimeout(format!(
                        "PRIMARY_RESOLVER_TIMEOUT_MS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidPrimaryTimeout(
                        "PRIMARY_RESOLVER_TIMEOUT_MS must be greater than 0".to_string(),
                    ));
                }

                if value > MAX_PRIMARY_TIMEOUT_MS {
                    return Err(ConfigError::InvalidPrimaryTimeout(format!(
                        "PRIMARY_RESOLVER_TIMEOUT_MS must not exceed {}, got {}",
                        MAX_PRIMARY_TIMEOUT_MS, value
                    )));
                }

                value
            } else {
                DEFAULT_PRIMARY_TIMEOUT_MS
            };

        let excluded_prefixes = match non_empty(vars, "GATEKEEPER_EXCLUDED_PREFIXES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        };

        Ok(Config {
            bind_address,
            auth_base_url,
            auth_anon_key,
            service_role_key,
            data_base_url,
            session_cookie_name,
            session_cookie_prefix,
            fallback_min_value_len,
            primary_timeout_ms,
            excluded_prefixes,
        })
    }

    /// Primary resolver bound as a `Duration`.
    pub fn primary_timeout(&self) -> Duration {
        Duration::from_millis(self.primary_timeout_ms)
    }
}

/// Value of `key`, treating an empty string as unset.
fn non_empty(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidBaseUrl(format!("{} must be a valid URL, got '{}': {}", key, value, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "{} must use http or https, got '{}'",
            key,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "{} must include a host",
            key
        )));
    }

    Ok(url)
}

/// `sb-<first host label>-auth-token`, the authority SDKs' own naming.
fn default_cookie_name(url: &Url) -> String {
    let project_ref = url
        .host_str()
        .and_then(|host| host.split('.').next())
        .unwrap_or("app");
    format!("{}{}-auth-token", DEFAULT_PROVIDER_PREFIX, project_ref)
}
