//! Page-load extractor.
//!
//! Server-rendered pages read the identity the gatekeeper already attached.
//! When the gatekeeper skipped the request, the extractor resolves on its own
//! through the same resolver. Cookies refreshed on that path are not written
//! back; only the gatekeeper forwards them.

use crate::observability::metrics::record_resolution;
use crate::resolver::{ResolvedIdentity, UnauthenticatedReason};
use crate::routes::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use futures::FutureExt;
use std::convert::Infallible;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// The request's identity, authenticated or not. Never rejects.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub ResolvedIdentity);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<ResolvedIdentity>() {
            return Ok(Self(identity.clone()));
        }

        let start = Instant::now();
        let identity = match AssertUnwindSafe(state.resolver.resolve(&parts.headers))
            .catch_unwind()
            .await
        {
            Ok(resolution) => resolution.identity,
            Err(_) => {
                tracing::error!(target: "sg.extract", "Session resolution panicked, rendering as guest");
                ResolvedIdentity::Unauthenticated {
                    reason: UnauthenticatedReason::UpstreamError,
                }
            }
        };
        record_resolution("page", identity.outcome_label(), start.elapsed());

        Ok(Self(identity))
    }
}
