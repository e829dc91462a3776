//! Session cookie decoding.
//!
//! Decoding is total from the caller's point of view: every malformed value
//! ends as `None` (or a `DecodeError` for diagnostics), never a panic.
//!
//! # Accepted encodings
//!
//! Attempts run in order and the first acceptable payload wins:
//!
//! 1. URL-decoded value, parsed as JSON
//! 2. Raw value, parsed as JSON
//!
//! Within each attempt a `base64-` prefix marks URL-safe base64 of the JSON,
//! which is how newer authority SDKs write the cookie.
//!
//! # Security
//!
//! - Values are size-checked BEFORE any decoding (DoS prevention)
//! - The access token is opaque here; it is never verified cryptographically

use super::payload::SessionPayload;
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use common::secret::ExposeSecret;
use thiserror::Error;

/// Maximum accepted cookie value size in bytes (16KB).
///
/// A browser caps a single cookie near 4KB; chunked sessions are reassembled
/// before decoding, so 16KB leaves room for four chunks.
pub const MAX_SESSION_COOKIE_BYTES: usize = 16 * 1024;

/// Prefix marking a base64-encoded session value.
pub const BASE64_PREFIX: &str = "base64-";

/// URL-safe base64 that tolerates both padded and unpadded input.
const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reasons a cookie value did not yield a usable session payload.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Value exceeds [`MAX_SESSION_COOKIE_BYTES`].
    #[error("session cookie exceeds {MAX_SESSION_COOKIE_BYTES} bytes")]
    TooLarge,

    /// Value is not a structured session payload in any accepted encoding.
    #[error("session cookie is not a structured payload")]
    Malformed,

    /// Payload parsed but `access_token` or `user.id` is empty.
    #[error("session payload is missing required fields")]
    MissingFields,
}

/// Decode a session cookie value, discarding the failure reason.
pub fn decode(cookie_value: &str) -> Option<SessionPayload> {
    decode_detailed(cookie_value).ok()
}

/// Decode a session cookie value.
///
/// When both attempts fail, `MissingFields` is reported over `Malformed`
/// since it is the more specific diagnosis.
pub fn decode_detailed(cookie_value: &str) -> Result<SessionPayload, DecodeError> {
    if cookie_value.len() > MAX_SESSION_COOKIE_BYTES {
        return Err(DecodeError::TooLarge);
    }

    let url_decoded = urlencoding::decode(cookie_value)
        .map_err(|_| DecodeError::Malformed)
        .and_then(|decoded| parse_payload(&decoded));

    let first_error = match url_decoded {
        Ok(payload) => return Ok(payload),
        Err(e) => e,
    };

    parse_payload(cookie_value).map_err(|second_error| {
        if first_error == DecodeError::MissingFields || second_error == DecodeError::MissingFields
        {
            DecodeError::MissingFields
        } else {
            second_error
        }
    })
}

/// Parse one candidate text into a validated payload.
fn parse_payload(text: &str) -> Result<SessionPayload, DecodeError> {
    let payload: SessionPayload = match text.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = BASE64_URL_LENIENT
                .decode(encoded)
                .map_err(|_| DecodeError::Malformed)?;
            serde_json::from_slice(&bytes).map_err(|_| DecodeError::Malformed)?
        }
        None => serde_json::from_str(text).map_err(|_| DecodeError::Malformed)?,
    };

    if payload.access_token.expose_secret().is_empty() || payload.user.id.is_empty() {
        return Err(DecodeError::MissingFields);
    }

    Ok(payload)
}
