use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use bookmyfield::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "BookMyField edge proxy starting: RUST_LOG='{}', port={}, upstream='{}', timeout_ms={}",
        rust_log, config.proxy.port, config.proxy.upstream, config.proxy.timeout_ms
    );

    bookmyfield::proxy::run(&config.proxy).await
}
