//! Metrics relay service
//!
//! Thin HTTP glue in front of the matching engine's metrics endpoint:
//! `GET /health` for liveness and `GET /metrics-proxy`, which performs one
//! upstream call with a short timeout and relays the body verbatim.

use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::error::Result;

/// Default upstream engine base URL, overridable via `ENGINE_URL`
pub const DEFAULT_UPSTREAM_URL: &str = "http://engine:8080";

/// Content type of the relayed metrics payload
const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Relay configuration, injected at construction
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Upstream engine base URL (no trailing slash)
    pub upstream_url: String,
    /// Timeout for the single upstream call
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            timeout: Duration::from_secs(2),
        }
    }
}

impl RelayConfig {
    /// Build a config from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("ENGINE_URL") {
            if !url.is_empty() {
                config.upstream_url = url;
            }
        }
        config
    }

    /// Override the upstream base URL
    pub fn with_upstream(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }
}

#[derive(Clone)]
struct RelayState {
    upstream_url: String,
    client: reqwest::Client,
}

/// Build the relay router with its routes and shared state
pub fn router(config: RelayConfig) -> Result<Router> {
    let client = reqwest::Client::builder().timeout(config.timeout).build()?;
    let state = RelayState {
        upstream_url: config.upstream_url,
        client,
    };
    Ok(Router::new()
        .route("/health", get(health))
        .route("/metrics-proxy", get(metrics_proxy))
        .with_state(state))
}

/// Bind and serve the relay until the task is stopped
pub async fn serve(addr: SocketAddr, config: RelayConfig) -> Result<()> {
    let app = router(config)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Relay listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics_proxy(State(state): State<RelayState>) -> Response {
    let url = format!("{}/metrics", state.upstream_url);
    let upstream = async {
        let resp = state.client.get(&url).send().await?;
        resp.error_for_status()?.text().await
    }
    .await;

    match upstream {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!("Upstream metrics call failed: {}", err);
            (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response()
        }
    }
}
