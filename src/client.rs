//!
//! Backend request client
//! ----------------------
//! Every backend call goes through `RequestClient`:
//! - the bearer token is read from the `TokenStore` at call time and attached when present;
//! - JSON bodies are sent with `Content-Type: application/json`;
//! - non-2xx responses and transport failures become an `ApiError`;
//! - a 401 notifies every subscribed `SessionListener` before the error is returned.
//!
//! Calls are attempted exactly once. The transport aborts a call past the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use parking_lot::RwLock;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::ApiResult;
use crate::identity::TokenStore;

pub mod classify;
pub mod request;

pub use request::RequestDescriptor;

/// Receives the "unauthenticated" signal emitted on every 401.
pub trait SessionListener: Send + Sync {
    fn on_unauthenticated(&self);
}

#[derive(Clone)]
pub struct RequestClient {
    base: String,
    http: reqwest::Client,
    store: TokenStore,
    listeners: Arc<RwLock<Vec<Arc<dyn SessionListener>>>>,
}

impl RequestClient {
    pub fn new(config: &ClientConfig, store: TokenStore) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("building HTTP client")?;
        Ok(Self::with_http(&config.base_url, http, store))
    }

    pub fn with_http(base_url: &str, http: reqwest::Client, store: TokenStore) -> Self {
        Self {
            base: base_url.trim_end_matches('/').to_string(),
            http,
            store,
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn base_url(&self) -> &str { &self.base }

    pub fn store(&self) -> &TokenStore { &self.store }

    pub fn subscribe(&self, listener: Arc<dyn SessionListener>) {
        self.listeners.write().push(listener);
    }

    fn url_for(&self, path: &str) -> String {
        if path.is_empty() {
            self.base.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base, path)
        } else {
            format!("{}/{}", self.base, path)
        }
    }

    fn emit_unauthenticated(&self) {
        // snapshot first so a listener may subscribe/unsubscribe without deadlocking
        let listeners: Vec<Arc<dyn SessionListener>> = self.listeners.read().clone();
        for l in listeners {
            l.on_unauthenticated();
        }
    }

    /// Send the request and return the raw success body.
    pub async fn execute(&self, req: RequestDescriptor) -> ApiResult<(StatusCode, Vec<u8>)> {
        let url = self.url_for(&req.path);
        debug!(target: "client", method = %req.method, url = %url, "request");

        let mut builder = self.http.request(req.method.clone(), &url);
        match self.store.access_token() {
            Some(token) => builder = builder.bearer_auth(token),
            None => debug!(target: "client", "no access token, sending anonymously"),
        }
        for (name, value) in &req.extra_headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }

        let resp = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "client", method = %req.method, url = %url, "transport failure: {}", e);
                return Err(classify::transport_error(&e));
            }
        };
        let status = resp.status();
        // the status line alone decides the forced logout; the body read below may still fail
        if status == StatusCode::UNAUTHORIZED {
            self.emit_unauthenticated();
        }
        let body = resp.bytes().await.map_err(|e| {
            warn!(target: "client", url = %url, "failed reading response body: {}", e);
            classify::transport_error(&e)
        })?
        .to_vec();
        debug!(target: "client", status = status.as_u16(), url = %url, "response");

        if status.is_success() {
            return Ok((status, body));
        }
        let err = classify::status_error(status, &body);
        warn!(target: "client", status = status.as_u16(), kind = %err.kind, url = %url, "request failed: {}", err.message);
        Err(err)
    }

    /// Send and decode the success body as `T`.
    pub async fn send<T: DeserializeOwned>(&self, req: RequestDescriptor) -> ApiResult<T> {
        let (status, body) = self.execute(req).await?;
        serde_json::from_slice(&body).map_err(|e| classify::decode_error(status, &e))
    }

    /// Send and discard whatever the success body contains.
    pub async fn send_unit(&self, req: RequestDescriptor) -> ApiResult<()> {
        self.execute(req).await.map(|_| ())
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(RequestDescriptor::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(RequestDescriptor::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.send(RequestDescriptor::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send_unit(RequestDescriptor::delete(path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joining() {
        let c = RequestClient::with_http("http://h/api/v1/", reqwest::Client::new(), TokenStore::in_memory());
        assert_eq!(c.base_url(), "http://h/api/v1");
        assert_eq!(c.url_for("/fields"), "http://h/api/v1/fields");
        assert_eq!(c.url_for("fields?location=x"), "http://h/api/v1/fields?location=x");
        assert_eq!(c.url_for(""), "http://h/api/v1");
    }
}
