//! Primary resolver: the issuing authority's own "current user" lookup.
//!
//! The resolution core always asks the authority first. Its answer is
//! authoritative and may carry refreshed session cookies; manual cookie
//! decoding is only the degradation path.
//!
//! # Security
//!
//! - The public client key is the only credential sent besides the user's own
//!   access token
//! - Upstream error bodies are never propagated, only status codes
//! - One attempt per request; the caller bounds it with a timeout

use crate::config::Config;
use crate::session::{decode, CookieLocator, UserIdentity};
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use reqwest::header::SET_COOKIE;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Outer bound on a single authority request. The resolver applies its own,
/// much tighter, bound on top.
const AUTHORITY_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Failure talking to the issuing authority.
///
/// Never surfaced to callers of the resolver: it is logged, counted, and
/// resolution continues from the session cookie.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("authority request failed: {0}")]
    Transport(String),

    #[error("authority returned status {0}")]
    Status(u16),

    #[error("authority response invalid: {0}")]
    InvalidResponse(String),

    #[error("authority did not answer within {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    /// Bounded label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Status(_) => "status",
            UpstreamError::InvalidResponse(_) => "invalid_response",
            UpstreamError::Timeout(_) => "timeout",
        }
    }
}

/// Result of a successful call to the authority.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimaryLookup {
    /// The current user, or `None` when the authority found no session.
    pub user: Option<UserIdentity>,

    /// Raw `Set-Cookie` values the authority wants written back.
    pub refreshed_cookies: Vec<String>,
}

impl PrimaryLookup {
    /// No session, nothing to refresh.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: UserIdentity) -> Self {
        Self {
            user: Some(user),
            refreshed_cookies: Vec::new(),
        }
    }

    pub fn with_refreshed_cookies(mut self, cookies: Vec<String>) -> Self {
        self.refreshed_cookies = cookies;
        self
    }
}

/// The authority's request-bound "get current user" primitive.
#[async_trait]
pub trait PrimaryResolver: Send + Sync {
    /// Look up the user for a raw `Cookie` header.
    async fn current_user(&self, cookie_header: &str) -> Result<PrimaryLookup, UpstreamError>;
}

/// Primary resolver backed by the authority's HTTP API.
///
/// Reads the access token from the canonical session cookie and calls
/// `GET {base}/auth/v1/user`.
pub struct HttpPrimaryResolver {
    http_client: Client,
    user_url: String,
    anon_key: SecretString,
    locator: CookieLocator,
}

impl HttpPrimaryResolver {
    /// Create a resolver for the authority at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Authority base URL
    /// * `anon_key` - Public client key sent as `apikey`
    /// * `cookie_name` - Canonical session cookie name
    pub fn new(base_url: &str, anon_key: SecretString, cookie_name: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(AUTHORITY_REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "sg.resolver.primary", error = %e, "Failed to build HTTP client with custom config, using defaults");
                Client::new()
            });

        Self {
            http_client,
            user_url: format!("{}/auth/v1/user", base_url.trim_end_matches('/')),
            anon_key,
            locator: CookieLocator::canonical_only(cookie_name),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.auth_base_url,
            config.auth_anon_key.clone(),
            &config.session_cookie_name,
        )
    }
}

#[async_trait]
impl PrimaryResolver for HttpPrimaryResolver {
    #[instrument(skip_all, name = "sg.resolver.primary")]
    async fn current_user(&self, cookie_header: &str) -> Result<PrimaryLookup, UpstreamError> {
        let Some(entry) = self.locator.locate(cookie_header) else {
            return Ok(PrimaryLookup::anonymous());
        };

        let Some(session) = decode(&entry.value) else {
            tracing::debug!(target: "sg.resolver.primary", "Canonical cookie has no usable access token");
            return Ok(PrimaryLookup::anonymous());
        };

        let response = self
            .http_client
            .get(&self.user_url)
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(session.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(target: "sg.resolver.primary", error = %e, "Authority request failed");
                UpstreamError::Transport(e.to_string())
            })?;

        let refreshed_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::debug!(target: "sg.resolver.primary", status = %status, "Authority rejected the session");
            return Ok(PrimaryLookup::anonymous().with_refreshed_cookies(refreshed_cookies));
        }

        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let user: UserIdentity = response
            .json()
            .await
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        if user.id.is_empty() {
            return Err(UpstreamError::InvalidResponse(
                "user id missing".to_string(),
            ));
        }

        tracing::debug!(target: "sg.resolver.primary", "Authority confirmed the session");
        Ok(PrimaryLookup::authenticated(user).with_refreshed_cookies(refreshed_cookies))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_url_strips_trailing_slash() {
        let resolver = HttpPrimaryResolver::new(
            "https://auth.example.com/",
            SecretString::from("anon"),
            "sb-auth-auth-token",
        );
        assert_eq!(resolver.user_url, "https://auth.example.com/auth/v1/user");
    }

    #[test]
    fn test_upstream_error_kinds() {
        assert_eq!(UpstreamError::Transport("x".into()).kind(), "transport");
        assert_eq!(UpstreamError::Status(502).kind(), "status");
        assert_eq!(
            UpstreamError::InvalidResponse("x".into()).kind(),
            "invalid_response"
        );
        assert_eq!(
            UpstreamError::Timeout(Duration::from_millis(300)).kind(),
            "timeout"
        );
    }

    #[test]
    fn test_primary_lookup_builders() {
        assert!(PrimaryLookup::anonymous().user.is_none());

        let lookup = PrimaryLookup::authenticated(UserIdentity::new("u1"))
            .with_refreshed_cookies(vec!["a=b".to_string()]);
        assert_eq!(lookup.user.unwrap().id, "u1");
        assert_eq!(lookup.refreshed_cookies, vec!["a=b".to_string()]);
    }

    #[tokio::test]
    async fn test_no_cookie_skips_network() {
        // Unroutable base URL: any network call would fail with Transport.
        let resolver = HttpPrimaryResolver::new(
            "http://127.0.0.1:9",
            SecretString::from("anon"),
            "sb-app-auth-token",
        );

        let lookup = resolver.current_user("theme=dark").await.unwrap();
        assert!(lookup.user.is_none());
        assert!(lookup.refreshed_cookies.is_empty());
    }
}
