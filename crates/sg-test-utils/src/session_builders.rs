//! Builder patterns for session cookie construction
//!
//! Produces cookie values in every encoding the decoder accepts, so tests
//! read as "a live session for alice, base64-encoded, split into chunks"
//! rather than hand-built JSON strings.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use serde_json::json;

/// Fixed "now" for tests that drive a `FixedClock`.
pub const TEST_NOW: i64 = 1_700_000_000;

/// Canonical cookie name the test configuration derives
/// (`AUTH_BASE_URL=http://auth.test`).
pub const TEST_COOKIE_NAME: &str = "sb-auth-auth-token";

/// Builder for session cookie payloads
///
/// # Example
/// ```rust,ignore
/// let header = TestSessionBuilder::new()
///     .for_user("alice")
///     .with_email("alice@example.com")
///     .expires_at(TEST_NOW + 60)
///     .cookie_header(TEST_COOKIE_NAME);
/// ```
pub struct TestSessionBuilder {
    access_token: String,
    refresh_token: Option<String>,
    user_id: String,
    email: Option<String>,
    expires_at: Option<i64>,
}

impl TestSessionBuilder {
    /// Create a new builder: user `test-user`, expiring in an hour
    pub fn new() -> Self {
        Self {
            access_token: "test-access-token".to_string(),
            refresh_token: Some("test-refresh-token".to_string()),
            user_id: "test-user".to_string(),
            email: None,
            expires_at: Some((Utc::now() + Duration::seconds(3600)).timestamp()),
        }
    }

    /// Set the user id
    pub fn for_user(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }

    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = token.to_string();
        self
    }

    /// Set an absolute expiry (unix seconds)
    pub fn expires_at(mut self, timestamp: i64) -> Self {
        self.expires_at = Some(timestamp);
        self
    }

    /// Omit `expires_at` entirely
    pub fn without_expiry(mut self) -> Self {
        self.expires_at = None;
        self
    }

    pub fn without_refresh_token(mut self) -> Self {
        self.refresh_token = None;
        self
    }

    /// Build the payload as a JSON value
    pub fn build(&self) -> serde_json::Value {
        let mut user = json!({ "id": self.user_id });
        if let Some(email) = &self.email {
            user["email"] = json!(email);
        }

        let mut payload = json!({
            "access_token": self.access_token,
            "token_type": "bearer",
            "user": user,
        });
        if let Some(refresh_token) = &self.refresh_token {
            payload["refresh_token"] = json!(refresh_token);
        }
        if let Some(expires_at) = self.expires_at {
            payload["expires_at"] = json!(expires_at);
            payload["expires_in"] = json!(3600);
        }
        payload
    }

    /// Raw JSON text
    pub fn to_json(&self) -> String {
        self.build().to_string()
    }

    /// URL-encoded JSON, the way browsers usually store it
    pub fn url_encoded(&self) -> String {
        urlencoding::encode(&self.to_json()).into_owned()
    }

    /// `base64-` prefixed, unpadded URL-safe base64
    pub fn base64_prefixed(&self) -> String {
        format!("base64-{}", URL_SAFE_NO_PAD.encode(self.to_json()))
    }

    /// `Cookie` header carrying the URL-encoded payload under `name`
    pub fn cookie_header(&self, name: &str) -> String {
        format!("{}={}", name, self.url_encoded())
    }

    /// `Cookie` header with the URL-encoded payload split into `name.0`,
    /// `name.1`, ... chunks of at most `chunk_size` bytes
    pub fn chunked_cookie_header(&self, name: &str, chunk_size: usize) -> String {
        let encoded = self.url_encoded();
        encoded
            .as_bytes()
            .chunks(chunk_size.max(1))
            .enumerate()
            .map(|(i, chunk)| {
                format!(
                    "{}.{}={}",
                    name,
                    i,
                    std::str::from_utf8(chunk).expect("url-encoded text is ascii")
                )
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Default for TestSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
