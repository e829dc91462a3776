//! Middleware for Session Gate.
//!
//! # Components
//!
//! - `gatekeeper` - Fail-open session refresh on every page request
//! - `guard` - Fail-closed session check for protected API routes
//! - `http_metrics` - HTTP request metrics

pub mod gatekeeper;
pub mod guard;
pub mod http_metrics;

pub use gatekeeper::{refresh_session, GatekeeperState, PathExclusions};
pub use guard::{require_session, GuardState};
pub use http_metrics::http_metrics_middleware;
