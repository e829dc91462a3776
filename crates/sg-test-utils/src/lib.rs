//! # Session Gate Test Utilities
//!
//! This crate provides:
//! - Session cookie builders (`TestSessionBuilder`) in every accepted encoding
//! - A scripted primary resolver (`MockPrimaryResolver`)
//! - Router and server harness (`test_router`, `TestServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sg_test_utils::*;
//!
//! let primary = Arc::new(MockPrimaryResolver::failing(503));
//! let state = test_state(test_config(&[]), primary, Arc::new(FixedClock::new(TEST_NOW)));
//! let app = test_router(state);
//!
//! let cookie = TestSessionBuilder::new()
//!     .for_user("alice")
//!     .expires_at(TEST_NOW + 60)
//!     .cookie_header(TEST_COOKIE_NAME);
//! ```

pub mod mock_primary;
pub mod server_harness;
pub mod session_builders;

pub use mock_primary::MockPrimaryResolver;
pub use server_harness::{test_config, test_router, test_state, TestServer};
pub use session_builders::{TestSessionBuilder, TEST_COOKIE_NAME, TEST_NOW};
