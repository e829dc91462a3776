//! Profile handler: reads the current user's row from the record store.

use crate::errors::ApiError;
use crate::resolver::AuthContext;
use axum::{Extension, Json};
use serde_json::Value;
use tracing::instrument;

const PROFILES_TABLE: &str = "profiles";

/// Handler for GET /api/v1/profile
///
/// Requires the handler guard. Uses the privileged data client the guard
/// attached, filtered to the resolved user's id.
///
/// # Errors
///
/// - `ApiError::NotFound` - no profile row for the user
/// - `ApiError::Upstream` - record store request failed
#[instrument(skip_all, name = "sg.handlers.profile")]
pub async fn get_profile(
    Extension(context): Extension<AuthContext>,
) -> Result<Json<Value>, ApiError> {
    let filters = [
        ("id", format!("eq.{}", context.user.id)),
        ("select", "*".to_string()),
    ];

    let rows = context
        .data_client
        .select(PROFILES_TABLE, &filters)
        .await?;

    rows.into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(PROFILES_TABLE.to_string()))
}
