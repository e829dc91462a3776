//! Session cookie handling: locate, decode, and check expiry.
//!
//! These are the pure building blocks of the manual resolution path. None of
//! them perform I/O or fail with an error the caller must handle.

pub mod decoder;
pub mod expiry;
pub mod locator;
pub mod payload;

pub use decoder::{decode, decode_detailed, DecodeError};
pub use expiry::is_live;
pub use locator::{CookieEntry, CookieLocator, CookieMatcher, CookieRule};
pub use payload::{SessionPayload, UserIdentity};
