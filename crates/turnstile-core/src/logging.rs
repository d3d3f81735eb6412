//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Calling this twice
/// returns an error instead of panicking.
pub fn init(config: &LoggingConfig) -> crate::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_target(true))
            .try_init(),
        _ => registry.with(fmt::layer().with_target(true)).try_init(),
    };

    result.map_err(|e| crate::Error::InternalError(format!("Failed to init logging: {}", e)))
}
