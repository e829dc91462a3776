//! Session expiry validation.

use super::payload::SessionPayload;

/// Whether a decoded session is still live at `now` (Unix seconds).
///
/// Fail-closed: a payload without `expires_at` is never live.
pub fn is_live(payload: &SessionPayload, now: i64) -> bool {
    matches!(payload.expires_at, Some(expires_at) if expires_at > now)
}
