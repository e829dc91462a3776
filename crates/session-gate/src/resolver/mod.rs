//! Identity resolution: primary lookup, cookie fallback, outcome types.

pub mod core;
pub mod identity;
pub mod primary;

pub use self::core::{joined_cookie_header, SessionResolver};
pub use identity::{
    AuthContext, IdentitySource, Resolution, ResolvedIdentity, UnauthenticatedReason,
};
pub use primary::{HttpPrimaryResolver, PrimaryLookup, PrimaryResolver, UpstreamError};
