//! Mock primary resolver
//!
//! Scripted stand-in for the issuing authority, with a call counter and a
//! record of the last `Cookie` header it was handed.

use async_trait::async_trait;
use session_gate::resolver::{PrimaryLookup, PrimaryResolver, UpstreamError};
use session_gate::session::UserIdentity;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Behavior {
    Authenticated(UserIdentity),
    Anonymous,
    Failing(u16),
    Hanging,
    Panicking,
}

/// Primary resolver with a fixed, scripted answer
///
/// # Example
/// ```rust,ignore
/// let primary = Arc::new(MockPrimaryResolver::failing(503));
/// let resolver = SessionResolver::new(primary.clone(), locator, clock, timeout);
/// // ... resolve ...
/// assert_eq!(primary.calls(), 1);
/// ```
#[derive(Debug)]
pub struct MockPrimaryResolver {
    behavior: Behavior,
    refreshed_cookies: Vec<String>,
    calls: AtomicUsize,
    last_cookie_header: Mutex<Option<String>>,
}

impl MockPrimaryResolver {
    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            refreshed_cookies: Vec::new(),
            calls: AtomicUsize::new(0),
            last_cookie_header: Mutex::new(None),
        }
    }

    /// Authority confirms this user regardless of the cookie
    pub fn authenticated(user: UserIdentity) -> Self {
        Self::with_behavior(Behavior::Authenticated(user))
    }

    /// Authority finds no session
    pub fn anonymous() -> Self {
        Self::with_behavior(Behavior::Anonymous)
    }

    /// Authority answers with an error status
    pub fn failing(status: u16) -> Self {
        Self::with_behavior(Behavior::Failing(status))
    }

    /// Authority never answers
    pub fn hanging() -> Self {
        Self::with_behavior(Behavior::Hanging)
    }

    /// The lookup panics
    pub fn panicking() -> Self {
        Self::with_behavior(Behavior::Panicking)
    }

    /// `Set-Cookie` values returned alongside any non-error answer
    pub fn with_refreshed_cookies(mut self, cookies: &[&str]) -> Self {
        self.refreshed_cookies = cookies.iter().map(|c| (*c).to_string()).collect();
        self
    }

    /// Number of lookups so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `Cookie` header passed to the most recent lookup
    pub fn last_cookie_header(&self) -> Option<String> {
        self.last_cookie_header.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrimaryResolver for MockPrimaryResolver {
    async fn current_user(&self, cookie_header: &str) -> Result<PrimaryLookup, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_cookie_header.lock().unwrap() = Some(cookie_header.to_string());

        match &self.behavior {
            Behavior::Authenticated(user) => Ok(PrimaryLookup::authenticated(user.clone())
                .with_refreshed_cookies(self.refreshed_cookies.clone())),
            Behavior::Anonymous => {
                Ok(PrimaryLookup::anonymous().with_refreshed_cookies(self.refreshed_cookies.clone()))
            }
            Behavior::Failing(status) => Err(UpstreamError::Status(*status)),
            Behavior::Hanging => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(PrimaryLookup::anonymous())
            }
            Behavior::Panicking => panic!("mock primary resolver panicked"),
        }
    }
}
