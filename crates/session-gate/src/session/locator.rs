//! Session cookie location.
//!
//! Finds the session cookie in a raw `Cookie` header. Naming conventions are
//! data: a [`CookieLocator`] holds an ordered list of [`CookieRule`]s, and
//! retiring or adding a convention means changing that list, not the code.
//!
//! # Default rules
//!
//! | Priority | Rule | Matches |
//! |---|---|---|
//! | 0 | `canonical` | exact canonical name |
//! | 10 | `canonical-chunked` | `<canonical>.0`, `<canonical>.1`, ... concatenated |
//! | 100 | `legacy-pattern` | contains prefix and `auth-token`, not `code-verifier`/`refresh`, value longer than the minimum |
//!
//! A higher-priority rule wins even when lower-priority candidates exist.
//! Within a rule the first cookie in header order wins.

use tracing::instrument;

/// Default provider prefix token in session cookie names.
pub const DEFAULT_PROVIDER_PREFIX: &str = "sb-";

/// Marker every session cookie name carries.
pub const AUTH_TOKEN_MARKER: &str = "auth-token";

/// Markers of cookies that share the session name but are not sessions.
pub const EXCLUDED_MARKERS: [&str; 2] = ["code-verifier", "refresh"];

/// Legacy matches must have a value strictly longer than this.
pub const DEFAULT_FALLBACK_MIN_VALUE_LEN: usize = 100;

/// A single name/value pair from a `Cookie` header.
#[derive(Clone, PartialEq, Eq)]
pub struct CookieEntry {
    /// Cookie name.
    pub name: String,

    /// Cookie value, unquoted.
    pub value: String,
}

/// Redacts the value, which carries credentials.
impl std::fmt::Debug for CookieEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieEntry")
            .field("name", &self.name)
            .field("value_len", &self.value.len())
            .finish()
    }
}

/// How a rule recognizes a session cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieMatcher {
    /// Name equals the given string.
    Exact(String),

    /// Name is `<base>.0`, `<base>.1`, ...; contiguous chunks are joined.
    Chunked(String),

    /// Name contains every `contains` token and no `excludes` token, and the
    /// value is longer than `min_value_len`.
    Pattern {
        contains: Vec<String>,
        excludes: Vec<String>,
        min_value_len: usize,
    },
}

/// A prioritized cookie naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieRule {
    /// Short name used in logs.
    pub label: &'static str,

    /// Matching logic.
    pub matcher: CookieMatcher,

    /// Lower runs first.
    pub priority: u16,
}

impl CookieRule {
    /// Rule matching the canonical cookie name exactly.
    pub fn exact(name: &str) -> Self {
        Self {
            label: "canonical",
            matcher: CookieMatcher::Exact(name.to_string()),
            priority: 0,
        }
    }

    /// Rule reassembling a chunked canonical cookie.
    pub fn chunked(name: &str) -> Self {
        Self {
            label: "canonical-chunked",
            matcher: CookieMatcher::Chunked(name.to_string()),
            priority: 10,
        }
    }

    /// Rule matching the legacy naming pattern.
    pub fn legacy_pattern(provider_prefix: &str, min_value_len: usize) -> Self {
        Self {
            label: "legacy-pattern",
            matcher: CookieMatcher::Pattern {
                contains: vec![provider_prefix.to_string(), AUTH_TOKEN_MARKER.to_string()],
                excludes: EXCLUDED_MARKERS.iter().map(|m| m.to_string()).collect(),
                min_value_len,
            },
            priority: 100,
        }
    }

    /// First cookie (in header order) satisfying this rule.
    fn find(&self, cookies: &[(&str, &str)]) -> Option<CookieEntry> {
        match &self.matcher {
            CookieMatcher::Exact(expected) => cookies
                .iter()
                .find(|(name, _)| name == expected)
                .map(|(name, value)| CookieEntry {
                    name: (*name).to_string(),
                    value: (*value).to_string(),
                }),
            CookieMatcher::Chunked(base) => {
                let mut value = String::new();
                let mut index = 0usize;
                loop {
                    let chunk_name = format!("{base}.{index}");
                    match cookies.iter().find(|(name, _)| *name == chunk_name) {
                        Some((_, chunk)) => value.push_str(chunk),
                        None => break,
                    }
                    index += 1;
                }
                (index > 0).then(|| CookieEntry {
                    name: base.clone(),
                    value,
                })
            }
            CookieMatcher::Pattern {
                contains,
                excludes,
                min_value_len,
            } => cookies
                .iter()
                .find(|(name, value)| {
                    contains.iter().all(|token| name.contains(token.as_str()))
                        && !excludes.iter().any(|token| name.contains(token.as_str()))
                        && value.len() > *min_value_len
                })
                .map(|(name, value)| CookieEntry {
                    name: (*name).to_string(),
                    value: (*value).to_string(),
                }),
        }
    }
}

/// Split a raw `Cookie` header into `(name, value)` pairs in header order.
///
/// Pairs without `=` or with an empty name are skipped. Surrounding double
/// quotes on a value are removed.
pub fn parse_cookie_header(raw: &str) -> impl Iterator<Item = (&str, &str)> {
    raw.split(';').filter_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let value = value.trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        Some((name, value))
    })
}

/// Ordered set of cookie rules.
#[derive(Debug, Clone)]
pub struct CookieLocator {
    rules: Vec<CookieRule>,
}

impl CookieLocator {
    /// Create a locator from rules in any order. Ties keep their given order.
    pub fn new(mut rules: Vec<CookieRule>) -> Self {
        rules.sort_by_key(|rule| rule.priority);
        Self { rules }
    }

    /// Default rules for a canonical cookie name.
    pub fn for_session_cookie(canonical_name: &str, provider_prefix: &str, min_value_len: usize) -> Self {
        Self::new(vec![
            CookieRule::exact(canonical_name),
            CookieRule::chunked(canonical_name),
            CookieRule::legacy_pattern(provider_prefix, min_value_len),
        ])
    }

    /// Only the canonical conventions (exact and chunked).
    pub fn canonical_only(canonical_name: &str) -> Self {
        Self::new(vec![
            CookieRule::exact(canonical_name),
            CookieRule::chunked(canonical_name),
        ])
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[CookieRule] {
        &self.rules
    }

    /// Locate the session cookie in a raw `Cookie` header.
    ///
    /// An empty or malformed header is not an error; it just yields `None`.
    #[instrument(skip_all, name = "sg.session.locate")]
    pub fn locate(&self, raw_cookie_header: &str) -> Option<CookieEntry> {
        let cookies: Vec<(&str, &str)> = parse_cookie_header(raw_cookie_header).collect();
        if cookies.is_empty() {
            return None;
        }

        for rule in &self.rules {
            if let Some(entry) = rule.find(&cookies) {
                tracing::debug!(
                    target: "sg.session.locator",
                    rule = rule.label,
                    cookie = %entry.name,
                    "Session cookie located"
                );
                return Some(entry);
            }
        }

        tracing::debug!(
            target: "sg.session.locator",
            cookie_count = cookies.len(),
            "No session cookie matched"
        );
        None
    }
}
