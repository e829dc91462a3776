//! Edge gatekeeper integration tests.
//!
//! Fail-open behaviour of `refresh_session` through the real router: the page
//! always renders, refreshed cookies come back as `Set-Cookie`, and excluded
//! paths never touch the resolver.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    body::Body,
    http::{
        header::{COOKIE, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use common::clock::FixedClock;
use http_body_util::BodyExt;
use session_gate::resolver::PrimaryResolver;
use session_gate::session::UserIdentity;
use sg_test_utils::{
    test_config, test_router, test_state, MockPrimaryResolver, TestServer, TestSessionBuilder,
    TEST_COOKIE_NAME, TEST_NOW,
};
use std::sync::Arc;
use tower::ServiceExt;

fn app(primary: Arc<dyn PrimaryResolver>) -> Router {
    test_router(test_state(
        test_config(&[]),
        primary,
        Arc::new(FixedClock::new(TEST_NOW)),
    ))
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_text(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_unauthenticated_request_still_reaches_page() {
    let response = app(Arc::new(MockPrimaryResolver::anonymous()))
        .oneshot(get_request("/", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response.into_body()).await.contains("not signed in"));
}

#[tokio::test]
async fn test_garbage_cookie_still_reaches_page() {
    let cookie = format!("{TEST_COOKIE_NAME}=%%%garbage");
    let response = app(Arc::new(MockPrimaryResolver::failing(502)))
        .oneshot(get_request("/", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_authenticated_page_uses_gatekeeper_identity() {
    let primary = Arc::new(MockPrimaryResolver::anonymous());
    let cookie = TestSessionBuilder::new()
        .for_user("alice")
        .with_email("alice@example.com")
        .expires_at(TEST_NOW + 60)
        .cookie_header(TEST_COOKIE_NAME);

    let response = app(primary.clone())
        .oneshot(get_request("/", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response.into_body())
        .await
        .contains("Signed in as alice@example.com"));
    // The extractor reused the gatekeeper's resolution.
    assert_eq!(primary.calls(), 1);
}

#[tokio::test]
async fn test_refreshed_cookies_forwarded_as_set_cookie() {
    let primary = Arc::new(
        MockPrimaryResolver::authenticated(UserIdentity::new("u1")).with_refreshed_cookies(&[
            "sb-auth-auth-token=new-session; Path=/; HttpOnly",
            "sb-auth-auth-token.0=; Max-Age=0",
        ]),
    );

    let response = app(primary)
        .oneshot(get_request("/", Some("sb-auth-auth-token=old")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookies: Vec<&str> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap())
        .collect();
    assert_eq!(
        set_cookies,
        vec![
            "sb-auth-auth-token=new-session; Path=/; HttpOnly",
            "sb-auth-auth-token.0=; Max-Age=0",
        ]
    );
}

#[tokio::test]
async fn test_excluded_paths_skip_resolution() {
    let primary = Arc::new(MockPrimaryResolver::authenticated(UserIdentity::new("u1")));
    let app = app(primary.clone());

    for uri in ["/health", "/static/app.js", "/logo.png", "/favicon.ico"] {
        let _ = app
            .clone()
            .oneshot(get_request(uri, Some("sb-auth-auth-token=x")))
            .await
            .unwrap();
    }

    assert_eq!(primary.calls(), 0);
}

#[tokio::test]
async fn test_panicking_resolver_still_reaches_page() {
    let response = app(Arc::new(MockPrimaryResolver::panicking()))
        .oneshot(get_request("/", Some("sb-auth-auth-token=x")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response.into_body()).await.contains("not signed in"));
}

#[tokio::test]
async fn test_spawned_server_serves_page_and_metrics() -> Result<(), anyhow::Error> {
    let state = test_state(
        test_config(&[]),
        Arc::new(MockPrimaryResolver::anonymous()),
        Arc::new(FixedClock::new(TEST_NOW)),
    );
    let server = TestServer::spawn(state).await?;
    let client = reqwest::Client::new();

    let page = client.get(format!("{}/", server.url())).send().await?;
    assert_eq!(page.status(), 200);

    let metrics = client.get(format!("{}/metrics", server.url())).send().await?;
    assert_eq!(metrics.status(), 200);

    let missing = client
        .get(format!("{}/does-not-exist", server.url()))
        .send()
        .await?;
    assert_eq!(missing.status(), 404);

    Ok(())
}
