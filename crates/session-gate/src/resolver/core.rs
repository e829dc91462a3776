//! Resolution core.
//!
//! One resolution path shared by every adapter: ask the primary resolver,
//! fall back to the session cookie, never fail.
//!
//! ```text
//! Cookie header
//!   -> primary resolver (bounded by timeout)
//!        user      -> Authenticated { source: Primary }
//!        no user   -> fallback
//!        error     -> log, fallback
//!   -> locate -> decode -> expiry
//!        ok        -> Authenticated { source: SessionCookie }
//!        otherwise -> Unauthenticated { reason }
//! ```

use crate::config::Config;
use crate::errors::GuardError;
use crate::observability::metrics;
use crate::resolver::identity::{
    AuthContext, IdentitySource, Resolution, ResolvedIdentity, UnauthenticatedReason,
};
use crate::resolver::primary::{PrimaryLookup, PrimaryResolver, UpstreamError};
use crate::services::data_client::{DataClient, PrivilegedCredentials};
use crate::session::{decode_detailed, is_live, CookieLocator};
use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use common::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Request-scoped identity resolution with cookie fallback.
pub struct SessionResolver {
    primary: Arc<dyn PrimaryResolver>,
    locator: CookieLocator,
    clock: Arc<dyn Clock>,
    primary_timeout: Duration,
}

impl SessionResolver {
    pub fn new(
        primary: Arc<dyn PrimaryResolver>,
        locator: CookieLocator,
        clock: Arc<dyn Clock>,
        primary_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            locator,
            clock,
            primary_timeout,
        }
    }

    /// Build a resolver with the configured cookie rules and timeout.
    pub fn from_config(
        config: &Config,
        primary: Arc<dyn PrimaryResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            primary,
            CookieLocator::for_session_cookie(
                &config.session_cookie_name,
                &config.session_cookie_prefix,
                config.fallback_min_value_len,
            ),
            clock,
            config.primary_timeout(),
        )
    }

    pub fn locator(&self) -> &CookieLocator {
        &self.locator
    }

    /// Resolve the identity behind a request's headers.
    ///
    /// Never fails. Multiple `Cookie` headers are joined the way HTTP/2
    /// clients split them.
    #[instrument(skip_all, name = "sg.resolver.resolve")]
    pub async fn resolve(&self, headers: &HeaderMap) -> Resolution {
        let cookie_header = joined_cookie_header(headers);
        let mut refreshed_cookies = Vec::new();

        match self.call_primary(&cookie_header).await {
            Ok(PrimaryLookup {
                user: Some(user),
                refreshed_cookies: cookies,
            }) => {
                tracing::debug!(target: "sg.resolver", source = "primary", "Identity resolved");
                return Resolution {
                    identity: ResolvedIdentity::Authenticated {
                        user,
                        source: IdentitySource::Primary,
                    },
                    refreshed_cookies: cookies,
                };
            }
            Ok(PrimaryLookup {
                user: None,
                refreshed_cookies: cookies,
            }) => {
                refreshed_cookies = cookies;
                metrics::record_primary_fallback("no_user");
            }
            Err(e) => {
                tracing::warn!(
                    target: "sg.resolver",
                    error = %e,
                    kind = e.kind(),
                    "Primary resolver failed, falling back to session cookie"
                );
                metrics::record_primary_fallback(e.kind());
            }
        }

        let identity = self.resolve_cookie_header(&cookie_header);
        tracing::debug!(
            target: "sg.resolver",
            outcome = identity.outcome_label(),
            "Identity resolved from session cookie"
        );

        Resolution {
            identity,
            refreshed_cookies,
        }
    }

    /// Manual path only: locate, decode, check expiry.
    pub fn resolve_cookie_header(&self, raw_cookie_header: &str) -> ResolvedIdentity {
        let Some(entry) = self.locator.locate(raw_cookie_header) else {
            return ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::NoCookieFound,
            };
        };

        let payload = match decode_detailed(&entry.value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::debug!(target: "sg.resolver", error = %e, "Session cookie rejected");
                return ResolvedIdentity::Unauthenticated {
                    reason: UnauthenticatedReason::DecodeFailed,
                };
            }
        };

        if !is_live(&payload, self.clock.now_unix()) {
            return ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::Expired,
            };
        }

        ResolvedIdentity::Authenticated {
            user: payload.user,
            source: IdentitySource::SessionCookie,
        }
    }

    /// Resolve, then require an identity and a privileged data client.
    ///
    /// # Errors
    ///
    /// - `GuardError::Unauthorized` - no usable identity
    /// - `GuardError::Configuration` - privileged credentials missing
    pub async fn resolve_or_fail(
        &self,
        headers: &HeaderMap,
        privileged: &PrivilegedCredentials,
    ) -> Result<AuthContext, GuardError> {
        let resolution = self.resolve(headers).await;

        match resolution.identity {
            ResolvedIdentity::Authenticated { user, .. } => {
                let data_client = DataClient::new(privileged)?;
                Ok(AuthContext { user, data_client })
            }
            ResolvedIdentity::Unauthenticated { reason } => Err(GuardError::Unauthorized(reason)),
        }
    }

    async fn call_primary(&self, cookie_header: &str) -> Result<PrimaryLookup, UpstreamError> {
        tokio::time::timeout(
            self.primary_timeout,
            self.primary.current_user(cookie_header),
        )
        .await
        .unwrap_or(Err(UpstreamError::Timeout(self.primary_timeout)))
    }
}

/// All `Cookie` header values joined with `"; "`.
///
/// Decoded lossily: a non-ASCII byte only spoils the pair it sits in, so the
/// other cookies in the same header still reach the locator.
pub fn joined_cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(COOKIE)
        .iter()
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use common::clock::FixedClock;

    const NOW: i64 = 1_700_000_000;

    struct Anonymous;

    #[async_trait]
    impl PrimaryResolver for Anonymous {
        async fn current_user(&self, _: &str) -> Result<PrimaryLookup, UpstreamError> {
            Ok(PrimaryLookup::anonymous())
        }
    }

    fn resolver() -> SessionResolver {
        SessionResolver::new(
            Arc::new(Anonymous),
            CookieLocator::for_session_cookie("sb-app-auth-token", "sb-", 100),
            Arc::new(FixedClock::new(NOW)),
            Duration::from_millis(300),
        )
    }

    fn session_json(expires_at: i64) -> String {
        format!(
            r#"{{"access_token":"at","expires_at":{expires_at},"user":{{"id":"u1"}}}}"#
        )
    }

    #[test]
    fn test_no_cookie() {
        assert_eq!(
            resolver().resolve_cookie_header(""),
            ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::NoCookieFound
            }
        );
    }

    #[test]
    fn test_live_cookie() {
        let header = format!("sb-app-auth-token={}", session_json(NOW + 60));
        let identity = resolver().resolve_cookie_header(&header);
        assert_eq!(identity.user().unwrap().id, "u1");
        assert!(matches!(
            identity,
            ResolvedIdentity::Authenticated {
                source: IdentitySource::SessionCookie,
                ..
            }
        ));
    }

    #[test]
    fn test_expired_cookie() {
        let header = format!("sb-app-auth-token={}", session_json(NOW));
        assert_eq!(
            resolver().resolve_cookie_header(&header),
            ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::Expired
            }
        );
    }

    #[test]
    fn test_garbage_cookie() {
        assert_eq!(
            resolver().resolve_cookie_header("sb-app-auth-token=%7Bnope"),
            ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::DecodeFailed
            }
        );
    }

    #[test]
    fn test_missing_fields_reported_as_decode_failed() {
        let header = format!(
            "sb-app-auth-token={}",
            r#"{"access_token":"","expires_at":99999999999,"user":{"id":"u1"}}"#
        );
        assert_eq!(
            resolver().resolve_cookie_header(&header),
            ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::DecodeFailed
            }
        );
    }

    #[test]
    fn test_joined_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1"));
        headers.append(COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(joined_cookie_header(&headers), "a=1; b=2");
        assert_eq!(joined_cookie_header(&HeaderMap::new()), "");
    }

    #[test]
    fn test_joined_cookie_header_keeps_pairs_beside_non_ascii() {
        let mut headers = HeaderMap::new();
        headers.append(
            COOKIE,
            HeaderValue::from_bytes(b"theme=d\xe0rk; a=1").unwrap(),
        );
        let joined = joined_cookie_header(&headers);
        assert!(joined.starts_with("theme=d"));
        assert!(joined.ends_with("; a=1"));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_primary_has_no_user() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("sb-app-auth-token={}", session_json(NOW + 60)))
                .unwrap(),
        );

        let resolution = resolver().resolve(&headers).await;
        assert_eq!(resolution.identity.user().unwrap().id, "u1");
        assert!(resolution.refreshed_cookies.is_empty());
    }
}
