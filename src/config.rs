//! Environment-driven configuration.
//! Defaults live on the structs; `from_lookup` overlays whatever the environment provides.
//! Empty values are treated as unset.

use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_PROXY_UPSTREAM: &str = "https://bookmyfield-production.up.railway.app/api/v1";

pub const ENV_API_BASE_URL: &str = "BOOKMYFIELD_API_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "BOOKMYFIELD_TIMEOUT_MS";
pub const ENV_PROXY_UPSTREAM: &str = "BOOKMYFIELD_PROXY_UPSTREAM";
pub const ENV_PROXY_PORT: &str = "BOOKMYFIELD_PROXY_PORT";
pub const ENV_SESSION_FILE: &str = "BOOKMYFIELD_SESSION_FILE";

/// Settings for the request client talking to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Upper bound per call; past it the call is aborted and classified as timeout.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_BASE_URL.to_string(), timeout_ms: 10_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub upstream: String,
    pub port: u16,
    pub timeout_ms: u64,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self { upstream: DEFAULT_PROXY_UPSTREAM.to_string(), port: 3000, timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub client: ClientConfig,
    pub proxy: ProxyConfig,
    pub session_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            proxy: ProxyConfig::default(),
            session_file: PathBuf::from("bookmyfield_session.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup. Unparseable numbers fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Config::default();
        if let Some(v) = get(ENV_API_BASE_URL) { cfg.client.base_url = v; }
        if let Some(v) = get(ENV_TIMEOUT_MS).and_then(|s| s.parse::<u64>().ok()) { cfg.client.timeout_ms = v; }
        if let Some(v) = get(ENV_PROXY_UPSTREAM) { cfg.proxy.upstream = v; }
        if let Some(v) = get(ENV_PROXY_PORT).and_then(|s| s.parse::<u16>().ok()) { cfg.proxy.port = v; }
        if let Some(v) = get(ENV_SESSION_FILE) { cfg.session_file = PathBuf::from(v); }
        cfg
    }
}
