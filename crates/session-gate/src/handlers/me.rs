//! Current user handler.

use crate::resolver::AuthContext;
use axum::{Extension, Json};
use serde::Serialize;
use tracing::instrument;

/// Response for `/api/v1/me`.
#[derive(Debug, Clone, Serialize)]
pub struct MeResponse {
    /// User identifier.
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Handler for GET /api/v1/me
///
/// Requires the handler guard.
///
/// ```json
/// { "id": "u1", "email": "a@example.com" }
/// ```
#[instrument(skip_all, name = "sg.handlers.me")]
pub async fn get_me(Extension(context): Extension<AuthContext>) -> Json<MeResponse> {
    tracing::debug!(target: "sg.handlers.me", "Returning current user");

    Json(MeResponse {
        id: context.user.id,
        email: context.user.email,
    })
}
