use std::fs::OpenOptions;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global tracing subscriber.
///
/// The filter honors `RUST_LOG` when set and falls back to the configured
/// level otherwise. Output goes to stderr, or to an append-only file when
/// `file_path` is set; `format = "json"` switches the human-readable layout
/// to JSON lines for log shippers.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = parse_level(&config.level)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    let registry = tracing_subscriber::registry().with(filter);

    let file = match &config.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    match (config.format.as_str() == "json", file) {
        (true, Some(file)) => registry.with(fmt::layer().json().with_writer(file)).init(),
        (true, None) => registry.with(fmt::layer().json()).init(),
        (false, Some(file)) => registry
            .with(fmt::layer().with_ansi(false).with_writer(file))
            .init(),
        (false, None) => registry.with(fmt::layer()).init(),
    }

    Ok(())
}

/// Resolve a configured level name.
fn parse_level(level: &str) -> anyhow::Result<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => anyhow::bail!("unknown log level {other:?}"),
    }
}
