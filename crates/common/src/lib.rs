//! Common utilities and types shared across Session Gate crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for injectable wall-clock sources
pub mod clock;
