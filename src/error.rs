//! Normalized client error model.
//! Every failure that can reach the UI (transport, HTTP status, undecodable body) is folded
//! into one `ApiError` carrying a taxonomy kind and a ready-to-render message.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Fixed UI strings. The dashboard is Indonesian-first, so are the fallbacks.
pub mod messages {
    pub const VALIDATION: &str = "Data yang dikirim tidak valid";
    pub const UNAUTHORIZED: &str = "Tidak terotorisasi. Silakan login kembali";
    pub const FORBIDDEN: &str = "Akses ditolak";
    pub const NOT_FOUND: &str = "Data tidak ditemukan";
    pub const SERVER: &str = "Error server internal";
    pub const TIMEOUT: &str = "Koneksi timeout. Server tidak merespons dalam waktu yang ditentukan.";
    pub const NETWORK: &str = "Tidak dapat terhubung ke server. Periksa koneksi internet Anda.";
    pub const UNKNOWN: &str = "Terjadi kesalahan yang tidak diketahui";
    pub const GENERIC_REASON: &str = "Terjadi kesalahan";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Timeout,
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Server,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Validation => "validation",
            ErrorKind::Server => "server",
            ErrorKind::Unknown => "unknown",
        }
    }

    /// Map an HTTP status to its taxonomy kind. Only meaningful for non-2xx statuses.
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ErrorKind::Validation,
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Unknown,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status when a response reached the client; `None` for transport failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        ApiError { kind, message: message.into(), status: None }
    }

    pub fn network() -> Self { Self::new(ErrorKind::Network, messages::NETWORK) }
    pub fn timeout() -> Self { Self::new(ErrorKind::Timeout, messages::TIMEOUT) }
    pub fn unknown<S: Into<String>>(msg: S) -> Self { Self::new(ErrorKind::Unknown, msg) }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_unauthorized(&self) -> bool { self.kind == ErrorKind::Unauthorized }

    /// A 2xx response that still ended up on the error path (e.g. a body that did not decode).
    pub fn is_misrouted_success(&self) -> bool {
        matches!(self.status, Some(s) if (200..300).contains(&s))
    }

    /// Text the UI should show as an error toast, or `None` when nothing should be shown.
    pub fn toast_message(&self) -> Option<&str> {
        if self.is_misrouted_success() { None } else { Some(self.message.as_str()) }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Status-keyed default message used when the server did not send one.
pub fn default_message(status: u16, reason: Option<&str>) -> String {
    match status {
        400 => messages::VALIDATION.to_string(),
        401 => messages::UNAUTHORIZED.to_string(),
        403 => messages::FORBIDDEN.to_string(),
        404 => messages::NOT_FOUND.to_string(),
        500 => messages::SERVER.to_string(),
        _ => format!("Error {}: {}", status, reason.filter(|r| !r.is_empty()).unwrap_or(messages::GENERIC_REASON)),
    }
}
