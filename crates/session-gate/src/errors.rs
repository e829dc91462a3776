//! Session Gate error types.
//!
//! Client-facing bodies use fixed strings. The underlying cause is logged
//! server-side and never echoed back.

use crate::config::ConfigError;
use crate::resolver::UnauthenticatedReason;
use crate::services::data_client::DataError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Handler guard rejection.
///
/// - Unauthorized: 401 Unauthorized
/// - Configuration, Internal: 500 Internal Server Error
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("Unauthorized: {0}")]
    Unauthorized(UnauthenticatedReason),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Internal server error")]
    Internal,
}

impl GuardError {
    pub fn status_code(&self) -> u16 {
        match self {
            GuardError::Unauthorized(_) => 401,
            GuardError::Configuration(_) | GuardError::Internal => 500,
        }
    }

    /// Bounded label for metrics.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            GuardError::Unauthorized(reason) => reason.as_str(),
            GuardError::Configuration(_) => "configuration_error",
            GuardError::Internal => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    details: &'static str,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            GuardError::Unauthorized(reason) => {
                tracing::debug!(target: "sg.middleware.guard", reason = %reason, "Request rejected");
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "Authentication required",
                )
            }
            GuardError::Configuration(err) => {
                tracing::error!(target: "sg.config", error = %err, "Guard cannot build privileged client");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Server configuration error",
                )
            }
            GuardError::Internal => {
                tracing::error!(target: "sg.middleware.guard", "Guard failed unexpectedly");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error",
                    "Internal error",
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

/// Handler error type.
///
/// - NotFound: 404 Not Found
/// - Upstream: 502 Bad Gateway
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream error: {0}")]
    Upstream(#[from] DataError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::NotFound(_) => 404,
            ApiError::Upstream(_) => 502,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            ApiError::NotFound(resource) => {
                tracing::debug!(target: "sg.api", resource = %resource, "Resource not found");
                (StatusCode::NOT_FOUND, "Not Found", "Resource not found")
            }
            ApiError::Upstream(err) => {
                tracing::warn!(target: "sg.api", error = %err, "Record store request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "Bad Gateway",
                    "Upstream service error",
                )
            }
        };

        (status, Json(ErrorResponse { error, details })).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_unauthorized() {
        let error = GuardError::Unauthorized(UnauthenticatedReason::Expired);
        assert_eq!(format!("{}", error), "Unauthorized: expired");
    }

    #[test]
    fn test_display_configuration() {
        let error = GuardError::Configuration(ConfigError::MissingCredential(
            "AUTH_SERVICE_ROLE_KEY",
        ));
        assert_eq!(
            format!("{}", error),
            "Configuration error: Missing privileged credential: AUTH_SERVICE_ROLE_KEY"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GuardError::Unauthorized(UnauthenticatedReason::NoCookieFound).status_code(),
            401
        );
        assert_eq!(
            GuardError::Configuration(ConfigError::MissingCredential("x")).status_code(),
            500
        );
        assert_eq!(GuardError::Internal.status_code(), 500);
        assert_eq!(ApiError::NotFound("profile".into()).status_code(), 404);
        assert_eq!(ApiError::Upstream(DataError::Status(503)).status_code(), 502);
    }

    #[tokio::test]
    async fn test_unauthorized_body_is_fixed() {
        let response =
            GuardError::Unauthorized(UnauthenticatedReason::DecodeFailed).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(
            body,
            serde_json::json!({"error": "Unauthorized", "details": "Authentication required"})
        );
    }

    #[tokio::test]
    async fn test_configuration_body_does_not_leak_cause() {
        let response = GuardError::Configuration(ConfigError::MissingCredential(
            "AUTH_SERVICE_ROLE_KEY",
        ))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["details"], "Server configuration error");
        assert!(!body.to_string().contains("SERVICE_ROLE"));
    }

    #[tokio::test]
    async fn test_internal_body() {
        let response = GuardError::Internal.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(
            body,
            serde_json::json!({"error": "Internal Server Error", "details": "Internal error"})
        );
    }

    #[tokio::test]
    async fn test_upstream_body_is_generic() {
        let response =
            ApiError::Upstream(DataError::InvalidResponse("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["details"], "Upstream service error");
        assert!(!body.to_string().contains("secret detail"));
    }
}
