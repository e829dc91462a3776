//! HTTP routes for Session Gate.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{
    http_metrics_middleware, refresh_session, require_session, GatekeeperState, GuardState,
    PathExclusions,
};
use crate::resolver::SessionResolver;
use crate::services::data_client::PrivilegedCredentials;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// The one resolver every adapter shares.
    pub resolver: Arc<SessionResolver>,

    /// Trusted record store credentials, injected into guarded handlers.
    pub privileged: PrivilegedCredentials,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/` - Home page, identity optional
/// - `/health` - Liveness probe (simple "OK")
/// - `/metrics` - Prometheus metrics endpoint
/// - `/api/v1/me` - Current user - requires a session
/// - `/api/v1/profile` - Current user's profile row - requires a session
/// - Gatekeeper on every request (it skips excluded paths itself)
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let gatekeeper_state = Arc::new(GatekeeperState {
        resolver: state.resolver.clone(),
        exclusions: PathExclusions::from_config(&state.config),
    });
    let guard_state = Arc::new(GuardState {
        resolver: state.resolver.clone(),
        privileged: state.privileged.clone(),
    });

    // Public routes (identity optional)
    let public_routes = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Protected routes (session required)
    let protected_routes = Router::new()
        .route("/api/v1/me", get(handlers::get_me))
        .route("/api/v1/profile", get(handlers::get_profile))
        .route_layer(middleware::from_fn_with_state(guard_state, require_session))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. refresh_session - Gatekeeper, attaches identity (innermost)
    // 2. TimeoutLayer
    // 3. TraceLayer
    // 4. http_metrics_middleware - Record ALL responses (outermost)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            gatekeeper_state,
            refresh_session,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(http_metrics_middleware))
}
