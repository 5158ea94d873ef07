//!
//! Edge proxy
//! ----------
//! Same-origin forwarding endpoint. Anything under `/api/proxy/*` is relayed to one fixed
//! upstream origin so browsers never make cross-origin calls to the backend themselves.
//!
//! Responsibilities:
//! - Preserve method, query string, the Authorization header and (for POST/PUT) the body.
//! - Re-serve JSON upstream bodies as JSON and pass any other body through as text.
//! - Attach permissive CORS headers to every response, including failures.
//! - Answer OPTIONS preflights locally without contacting the upstream.
//! - Turn any internal failure into a structured 500 instead of dropping the connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION, CONTENT_TYPE,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::ProxyConfig;

pub mod target;

pub use target::{target_url, PROXY_SEGMENT};

pub const ALLOW_ORIGIN: &str = "*";
pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization";

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("{0}")]
    Upstream(#[from] reqwest::Error),
    #[error("invalid JSON from upstream: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Shared handler state: the fixed upstream base and a pooled HTTP client.
#[derive(Clone)]
pub struct ProxyState {
    upstream: Arc<str>,
    http: reqwest::Client,
}

impl ProxyState {
    pub fn new(upstream: &str, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building upstream HTTP client")?;
        Ok(Self::with_http(upstream, http))
    }

    pub fn with_http(upstream: &str, http: reqwest::Client) -> Self {
        Self { upstream: Arc::from(upstream.trim_end_matches('/')), http }
    }

    pub fn upstream(&self) -> &str { &self.upstream }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/proxy", any(proxy_handler))
        .route("/api/proxy/{*path}", any(proxy_handler))
        .with_state(state)
}

/// Bind the configured port and serve until the process is stopped.
pub async fn run(config: &ProxyConfig) -> anyhow::Result<()> {
    let state = ProxyState::new(&config.upstream, Duration::from_millis(config.timeout_ms))?;
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!(target: "startup", "Starting edge proxy on {} -> {}", addr, state.upstream());
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding proxy listener on {}", addr))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn with_cors(resp: &mut Response) {
    let h = resp.headers_mut();
    h.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    h.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    h.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

fn preflight() -> Response {
    let mut resp = StatusCode::OK.into_response();
    with_cors(&mut resp);
    resp
}

fn failure(err: &ProxyError) -> Response {
    let mut resp = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Proxy request failed", "details": err.to_string()})),
    )
        .into_response();
    with_cors(&mut resp);
    resp
}

async fn proxy_handler(
    State(state): State<ProxyState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let span = info_span!("proxy", request_id = %Uuid::new_v4(), method = %method, path = %uri.path());
    async move {
        match method {
            Method::OPTIONS => preflight(),
            Method::GET | Method::POST | Method::PUT | Method::DELETE => {
                match forward(&state, method, &uri, &headers, body).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        error!(target: "proxy", "proxy error: {}", e);
                        failure(&e)
                    }
                }
            }
            _ => {
                let mut resp = (StatusCode::METHOD_NOT_ALLOWED, Json(json!({"error": "Method not allowed"}))).into_response();
                with_cors(&mut resp);
                resp
            }
        }
    }
    .instrument(span)
    .await
}

async fn forward(
    state: &ProxyState,
    method: Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let url = target_url(&state.upstream, uri.path(), uri.query());
    info!(target: "proxy", "forwarding {} to {}", method, url);

    let mut req = state
        .http
        .request(method.clone(), &url)
        .header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(auth) = headers.get(AUTHORIZATION) {
        req = req.header(AUTHORIZATION, auth.clone());
    }
    if matches!(method, Method::POST | Method::PUT) && !body.is_empty() {
        req = req.body(body);
    }

    let upstream = req.send().await?;
    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let bytes = upstream.bytes().await?;
    info!(target: "proxy", status = status.as_u16(), bytes = bytes.len(), "upstream responded");

    let is_json = content_type
        .as_ref()
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    let mut resp = if bytes.is_empty() {
        status.into_response()
    } else if is_json {
        let value: serde_json::Value = serde_json::from_slice(&bytes)?;
        (status, Json(value)).into_response()
    } else {
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let mut r = (status, text).into_response();
        if let Some(ct) = content_type {
            r.headers_mut().insert(CONTENT_TYPE, ct);
        }
        r
    };
    with_cors(&mut resp);
    Ok(resp)
}
