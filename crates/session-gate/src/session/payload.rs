//! Session payload and user identity types.
//!
//! Tokens are held as `SecretString` and the user's identifiers are redacted
//! in Debug output, so a payload can be logged with `?payload` safely.

use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity claim carried by a session.
///
/// `id` is the only field guaranteed to be present and non-empty once a
/// payload has been accepted. Unknown fields are preserved in `extra`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier - redacted in Debug output.
    #[serde(default)]
    pub id: String,

    /// Email address, when the authority includes one - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Any additional fields the authority attached to the user.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserIdentity {
    /// Create an identity with just an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Custom Debug implementation that redacts `id` and `email`.
impl fmt::Debug for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserIdentity")
            .field("id", &"[REDACTED]")
            .field("email", &self.email.as_ref().map(|_| "[REDACTED]"))
            .field("extra_fields", &self.extra.len())
            .finish()
    }
}

/// Decoded contents of a session cookie.
///
/// Wire format (JSON, optionally URL-encoded or `base64-` prefixed):
///
/// ```json
/// {
///   "access_token": "eyJ...",
///   "refresh_token": "r1...",
///   "expires_at": 1735689600,
///   "expires_in": 3600,
///   "token_type": "bearer",
///   "user": { "id": "u1", "email": "a@example.com" }
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SessionPayload {
    /// Opaque credential issued by the authority. Never verified here.
    pub access_token: SecretString,

    /// Refresh credential, if the authority stored one in the cookie.
    #[serde(default)]
    pub refresh_token: Option<SecretString>,

    /// Identity claim.
    pub user: UserIdentity,

    /// Expiry as Unix seconds. Absent means the session is treated as expired.
    #[serde(default)]
    pub expires_at: Option<i64>,

    /// Lifetime in seconds at issue time (informational).
    #[serde(default)]
    pub expires_in: Option<i64>,

    /// Token type, usually "bearer".
    #[serde(default)]
    pub token_type: Option<String>,
}
