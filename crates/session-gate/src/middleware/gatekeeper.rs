//! Edge gatekeeper: runs before routing on every non-excluded path.
//!
//! Fail-open. The gatekeeper resolves the identity, attaches it to the request
//! for downstream handlers, forwards any refreshed session cookies on the
//! response, and always lets the request through. A panic inside resolution
//! is logged and the request proceeds as unauthenticated.

use crate::config::Config;
use crate::observability::metrics::record_resolution;
use crate::resolver::{ResolvedIdentity, SessionResolver, UnauthenticatedReason};
use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderValue},
    middleware::Next,
    response::Response,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Final path segment extensions served as static images.
const EXCLUDED_EXTENSIONS: [&str; 7] = ["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"];

/// Paths the gatekeeper never runs on.
#[derive(Debug, Clone)]
pub struct PathExclusions {
    prefixes: Vec<String>,
}

impl PathExclusions {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.excluded_prefixes.clone())
    }

    /// True for static assets, image files and configured prefixes.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self
            .prefixes
            .iter()
            .any(|prefix| matches_prefix(path, prefix))
        {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or(path);
        last_segment
            .rsplit_once('.')
            .is_some_and(|(_, ext)| {
                EXCLUDED_EXTENSIONS
                    .iter()
                    .any(|excluded| ext.eq_ignore_ascii_case(excluded))
            })
    }
}

/// A prefix ending in `/` matches anything below it. Otherwise it matches
/// the exact path or a path continuing with `/`, so `/health` covers
/// `/health/live` but not `/healthcare`.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => prefix.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// State for the gatekeeper middleware.
#[derive(Clone)]
pub struct GatekeeperState {
    pub resolver: Arc<SessionResolver>,
    pub exclusions: PathExclusions,
}

/// Fail-open session middleware.
///
/// # Response
///
/// - Always continues to the next handler
/// - Always inserts a `ResolvedIdentity` into extensions
/// - Appends refreshed `Set-Cookie` headers to the downstream response
#[instrument(skip_all, name = "sg.middleware.gatekeeper")]
pub async fn refresh_session(
    State(state): State<Arc<GatekeeperState>>,
    mut req: Request,
    next: Next,
) -> Response {
    if state.exclusions.is_excluded(req.uri().path()) {
        return next.run(req).await;
    }

    let start = Instant::now();
    let outcome = AssertUnwindSafe(state.resolver.resolve(req.headers()))
        .catch_unwind()
        .await;

    let refreshed_cookies = match outcome {
        Ok(resolution) => {
            record_resolution(
                "gatekeeper",
                resolution.identity.outcome_label(),
                start.elapsed(),
            );
            req.extensions_mut().insert(resolution.identity);
            resolution.refreshed_cookies
        }
        Err(_) => {
            tracing::error!(
                target: "sg.middleware.gatekeeper",
                "Session resolution panicked, continuing as unauthenticated"
            );
            record_resolution("gatekeeper", "internal_error", start.elapsed());
            req.extensions_mut().insert(ResolvedIdentity::Unauthenticated {
                reason: UnauthenticatedReason::UpstreamError,
            });
            Vec::new()
        }
    };

    let mut response = next.run(req).await;
    append_set_cookies(&mut response, &refreshed_cookies);
    response
}

fn append_set_cookies(response: &mut Response, cookies: &[String]) {
    for cookie in cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(
                    target: "sg.middleware.gatekeeper",
                    error = %e,
                    "Dropping refreshed cookie with invalid header value"
                );
            }
        }
    }
}
