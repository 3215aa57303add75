//! Tracing subscriber setup, once per process

use anyhow::{anyhow, Result};
use hotel_config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .try_init()
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
