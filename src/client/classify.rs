//! Response and transport classification into the normalized error taxonomy.

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{default_message, messages, ApiError, ErrorKind};

/// Pull a server-supplied message out of an error body: `error` first, then `message`.
pub fn server_message(body: &[u8]) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    ["error", "message"].iter().find_map(|k| {
        v.get(*k)
            .and_then(|m| m.as_str())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    })
}

/// Classify a non-2xx response.
pub fn status_error(status: StatusCode, body: &[u8]) -> ApiError {
    let code = status.as_u16();
    let message = server_message(body).unwrap_or_else(|| default_message(code, status.canonical_reason()));
    ApiError::new(ErrorKind::from_status(code), message).with_status(code)
}

/// Classify a failure where no usable response reached the client.
pub fn transport_error(err: &reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::timeout();
    }
    if err.is_builder() {
        // nothing was sent; keep the raw message
        let raw = err.to_string();
        return ApiError::unknown(if raw.is_empty() { messages::UNKNOWN.to_string() } else { raw });
    }
    ApiError::network()
}

/// A 2xx response whose body did not match the expected shape.
pub fn decode_error(status: StatusCode, err: &serde_json::Error) -> ApiError {
    ApiError::unknown(format!("unexpected response body: {}", err)).with_status(status.as_u16())
}
