//! Handler guard: fail-closed session check for protected routes.

use crate::errors::GuardError;
use crate::observability::metrics::record_resolution;
use crate::resolver::SessionResolver;
use crate::services::data_client::PrivilegedCredentials;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::IntoResponse,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// State for the guard middleware.
#[derive(Clone)]
pub struct GuardState {
    pub resolver: Arc<SessionResolver>,
    pub privileged: PrivilegedCredentials,
}

/// Require an authenticated session.
///
/// # Response
///
/// - 401 Unauthorized if no usable identity resolves
/// - 500 Internal Server Error if privileged credentials are missing or
///   resolution fails unexpectedly
/// - Otherwise continues with `AuthContext` in extensions
#[instrument(skip_all, name = "sg.middleware.guard")]
pub async fn require_session(
    State(state): State<Arc<GuardState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, GuardError> {
    let start = Instant::now();

    let result = AssertUnwindSafe(
        state
            .resolver
            .resolve_or_fail(req.headers(), &state.privileged),
    )
    .catch_unwind()
    .await
    .unwrap_or(Err(GuardError::Internal));

    let outcome = match &result {
        Ok(_) => "authenticated",
        Err(e) => e.outcome_label(),
    };
    record_resolution("guard", outcome, start.elapsed());

    let context = result?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}
