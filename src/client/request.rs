use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

/// One outgoing call, built per request and never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Path relative to the backend base, including any query string.
    pub path: String,
    pub body: Option<Value>,
    pub extra_headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn new<S: Into<String>>(method: Method, path: S) -> Self {
        Self { method, path: path.into(), body: None, extra_headers: Vec::new() }
    }

    pub fn get<S: Into<String>>(path: S) -> Self { Self::new(Method::GET, path) }
    pub fn post<S: Into<String>>(path: S) -> Self { Self::new(Method::POST, path) }
    pub fn put<S: Into<String>>(path: S) -> Self { Self::new(Method::PUT, path) }
    pub fn delete<S: Into<String>>(path: S) -> Self { Self::new(Method::DELETE, path) }

    /// Attach a JSON body. Serialization failures surface as `unknown` errors.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::unknown(format!("failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}
