//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for every credential that flows
//! through Session Gate: the public and service-role keys of the issuing
//! authority, and the access/refresh tokens carried in session cookies.
//!
//! `SecretString` implements `Debug` with redaction, so deriving `Debug` on a
//! struct holding one cannot leak the value through `{:?}` or tracing fields.
//! Reading the value requires an explicit `expose_secret()` call.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct ServiceKeys {
//!     project: String,
//!     service_role_key: SecretString,
//! }
//!
//! let keys = ServiceKeys {
//!     project: "acme".to_string(),
//!     service_role_key: SecretString::from("service-role-key"),
//! };
//!
//! assert!(!format!("{keys:?}").contains("service-role-key"));
//! assert_eq!(keys.service_role_key.expose_secret(), "service-role-key");
//! ```
//!
//! # Serde
//!
//! Secrets deserialize directly from JSON, which is how session payloads keep
//! their tokens redacted from the moment they are decoded.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
