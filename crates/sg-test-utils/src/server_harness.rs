//! Test server harness
//!
//! Builds the real Session Gate router around injected collaborators, either
//! as an in-process `Router` for `oneshot` tests or as a spawned server.

use common::clock::Clock;
use metrics_exporter_prometheus::PrometheusBuilder;
use session_gate::config::Config;
use session_gate::resolver::{PrimaryResolver, SessionResolver};
use session_gate::routes::{self, AppState};
use session_gate::services::PrivilegedCredentials;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::session_builders::TEST_COOKIE_NAME;

/// Test configuration: authority at `http://auth.test`, canonical cookie
/// [`TEST_COOKIE_NAME`], privileged key set. `overrides` replace or add
/// variables.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars = HashMap::from([
        ("AUTH_BASE_URL".to_string(), "http://auth.test".to_string()),
        ("AUTH_ANON_KEY".to_string(), "test-anon-key".to_string()),
        (
            "AUTH_SERVICE_ROLE_KEY".to_string(),
            "test-service-role-key".to_string(),
        ),
        ("SESSION_COOKIE_NAME".to_string(), TEST_COOKIE_NAME.to_string()),
        ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert((*key).to_string(), (*value).to_string());
    }

    Config::from_vars(&vars).expect("test config should load")
}

/// Application state wired from `config` with the given primary and clock.
pub fn test_state(
    config: Config,
    primary: Arc<dyn PrimaryResolver>,
    clock: Arc<dyn Clock>,
) -> Arc<AppState> {
    let resolver = Arc::new(SessionResolver::from_config(&config, primary, clock));
    let privileged = PrivilegedCredentials::from_config(&config);

    Arc::new(AppState {
        config,
        resolver,
        privileged,
    })
}

/// The real router. The metrics handle comes from an uninstalled recorder,
/// so any number of routers can coexist in one test process.
pub fn test_router(state: Arc<AppState>) -> axum::Router {
    let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
    routes::build_routes(state, metrics_handle)
}

/// Test harness for spawning Session Gate in E2E tests.
///
/// # Example
/// ```rust,ignore
/// let state = test_state(test_config(&[]), primary, clock);
/// let server = TestServer::spawn(state).await?;
/// let response = reqwest::get(format!("{}/health", server.url())).await?;
/// assert_eq!(response.status(), 200);
/// ```
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Spawn the router on a random local port.
    pub async fn spawn(state: Arc<AppState>) -> Result<Self, anyhow::Error> {
        let app = test_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
