//! Server-rendered pages.

use crate::extract::CurrentSession;
use crate::resolver::ResolvedIdentity;
use axum::response::Html;
use tracing::instrument;

/// Handler for GET /
///
/// Greets the signed-in user, or offers sign-in. Never rejects.
#[instrument(skip_all, name = "sg.handlers.home")]
pub async fn home(CurrentSession(identity): CurrentSession) -> Html<String> {
    Html(render_home(&identity))
}

fn render_home(identity: &ResolvedIdentity) -> String {
    let body = match identity.user() {
        Some(user) => {
            let name = user.email.as_deref().unwrap_or(user.id.as_str());
            format!("<p>Signed in as {}</p>", escape_html(name))
        }
        None => "<p>You are not signed in.</p>".to_string(),
    };

    format!("<!doctype html><html><head><title>Home</title></head><body>{body}</body></html>")
}

/// Cookie-derived values are attacker-controlled until the authority confirms
/// them.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{IdentitySource, UnauthenticatedReason};
    use crate::session::UserIdentity;

    #[test]
    fn test_render_signed_in() {
        let identity = ResolvedIdentity::Authenticated {
            user: UserIdentity::new("u1").with_email("a@example.com"),
            source: IdentitySource::Primary,
        };
        assert!(render_home(&identity).contains("Signed in as a@example.com"));
    }

    #[test]
    fn test_render_signed_out() {
        let identity = ResolvedIdentity::Unauthenticated {
            reason: UnauthenticatedReason::NoCookieFound,
        };
        assert!(render_home(&identity).contains("not signed in"));
    }

    #[test]
    fn test_render_escapes_identity() {
        let identity = ResolvedIdentity::Authenticated {
            user: UserIdentity::new("<script>alert(1)</script>"),
            source: IdentitySource::SessionCookie,
        };
        let html = render_home(&identity);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
