//! Session Gate Library
//!
//! Request-scoped authentication resolution for a web application whose
//! sessions are issued by an external authority and carried in cookies.
//!
//! # Architecture
//!
//! Every adapter delegates to one resolution core:
//!
//! ```text
//! middleware/gatekeeper.rs (fail-open) ─┐
//! middleware/guard.rs (fail-closed)    ─┼─> resolver/core.rs ─> resolver/primary.rs
//! extract.rs (page loads)              ─┘         │
//!                                                 └─> session/{locator,decoder,expiry}.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Guard and handler error types with HTTP status mapping
//! - `extract` - Identity extractor for server-rendered pages
//! - `handlers` - HTTP request handlers
//! - `middleware` - Gatekeeper, guard and HTTP metrics middleware
//! - `observability` - Prometheus metrics
//! - `resolver` - Primary lookup, cookie fallback, outcome types
//! - `routes` - Axum router setup
//! - `services` - Privileged record store client
//! - `session` - Cookie location, decoding and expiry

pub mod config;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod resolver;
pub mod routes;
pub mod services;
pub mod session;
