//! HTTP request handlers for Session Gate.

pub mod health;
pub mod me;
pub mod metrics;
pub mod pages;
pub mod profile;

pub use health::health_check;
pub use me::get_me;
pub use metrics::metrics_handler;
pub use pages::home;
pub use profile::get_profile;
