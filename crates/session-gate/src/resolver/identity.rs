//! Resolution outcome types.

use crate::services::data_client::DataClient;
use crate::session::UserIdentity;
use std::fmt;

/// Which step produced an authenticated identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    /// The issuing authority's own lookup.
    Primary,
    /// Manual decoding of the session cookie.
    SessionCookie,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Primary => "primary",
            IdentitySource::SessionCookie => "session_cookie",
        }
    }
}

/// Why a request has no identity.
///
/// The resolver reports `NoCookieFound`, `DecodeFailed` and `Expired`.
/// Missing fields are reported as `DecodeFailed`, and upstream failures are
/// logged and then resolved from the cookie instead of being surfaced.
/// `UpstreamError` is only attached by the fail-open adapters when resolution
/// itself panicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    NoCookieFound,
    DecodeFailed,
    MissingFields,
    Expired,
    UpstreamError,
}

impl UnauthenticatedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnauthenticatedReason::NoCookieFound => "no_cookie_found",
            UnauthenticatedReason::DecodeFailed => "decode_failed",
            UnauthenticatedReason::MissingFields => "missing_fields",
            UnauthenticatedReason::Expired => "expired",
            UnauthenticatedReason::UpstreamError => "upstream_error",
        }
    }
}

impl fmt::Display for UnauthenticatedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving a request's credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedIdentity {
    Authenticated {
        user: UserIdentity,
        source: IdentitySource,
    },
    Unauthenticated {
        reason: UnauthenticatedReason,
    },
}

impl ResolvedIdentity {
    /// The user, if authenticated.
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            ResolvedIdentity::Authenticated { user, .. } => Some(user),
            ResolvedIdentity::Unauthenticated { .. } => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, ResolvedIdentity::Authenticated { .. })
    }

    /// Bounded label for metrics and logs.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            ResolvedIdentity::Authenticated { .. } => "authenticated",
            ResolvedIdentity::Unauthenticated { reason } => reason.as_str(),
        }
    }
}

/// Identity plus any session cookies the authority refreshed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub identity: ResolvedIdentity,

    /// Raw `Set-Cookie` values to forward to the client.
    pub refreshed_cookies: Vec<String>,
}

/// What a guarded handler receives.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The resolved user.
    pub user: UserIdentity,

    /// Privileged record store client built from trusted configuration.
    pub data_client: DataClient,
}
