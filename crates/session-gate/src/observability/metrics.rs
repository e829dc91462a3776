//! Metrics definitions for Session Gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `sg_` prefix for Session Gate
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `context`: 3 values (gatekeeper, guard, page)
//! - `outcome`: bounded by resolution outcomes and guard errors
//! - `reason`: bounded by upstream error kinds plus `no_user`
//! - `endpoint`: known routes, everything else is `/other`
//!
//! No user identifiers, cookie names or token material are ever used as
//! labels.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the Prometheus recorder and return a handle for `/metrics`.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("sg_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Resolution is bounded by the primary resolver timeout (300ms default)
        .set_buckets_for_metric(
            Matcher::Prefix("sg_session_resolution".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.300, 0.500, 1.000,
            ],
        )
        .map_err(|e| format!("Failed to set session resolution buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `sg_http_requests_total`, `sg_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("sg_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("sg_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/me" => "/api/v1/me",
        "/api/v1/profile" => "/api/v1/profile",
        _ => "/other",
    }
}

// ============================================================================
// Session Resolution Metrics
// ============================================================================

/// Record one session resolution.
///
/// Metric: `sg_session_resolutions_total`, `sg_session_resolution_duration_seconds`
/// Labels: `context`, `outcome`
pub fn record_resolution(context: &'static str, outcome: &'static str, duration: Duration) {
    histogram!("sg_session_resolution_duration_seconds",
        "context" => context
    )
    .record(duration.as_secs_f64());

    counter!("sg_session_resolutions_total",
        "context" => context,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a fall back from the primary resolver to the session cookie.
///
/// Metric: `sg_primary_fallbacks_total`
/// Labels: `reason`
pub fn record_primary_fallback(reason: &'static str) {
    counter!("sg_primary_fallbacks_total",
        "reason" => reason
    )
    .increment(1);
}
